//! Translation of poll outcomes into effective samples.
//!
//! A failed poll does not mean the power is gone: the cloud service or the
//! network may simply be having a bad minute. Failures are therefore held
//! for a grace period, during which the last effective sample is repeated.
//! Once the failure streak reaches the grace period the device is treated
//! as unpowered.

use std::fmt::Display;
use std::time::Duration;

use super::Timestamp;
use crate::tracing::prelude::*;

/// What the state machine should see for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveSample {
    /// Fresh reading from the source.
    Observed(bool),

    /// The poll failed within the grace period; the previous effective
    /// value is repeated.
    Held(bool),

    /// The source has been unreachable for at least the grace period.
    ForcedAbsent,

    /// The poll failed and nothing is known yet.
    Unavailable,
}

impl EffectiveSample {
    pub fn value(self) -> Option<bool> {
        match self {
            EffectiveSample::Observed(value) | EffectiveSample::Held(value) => Some(value),
            EffectiveSample::ForcedAbsent => Some(false),
            EffectiveSample::Unavailable => None,
        }
    }
}

/// Persisted bookkeeping of the current failure streak.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachabilityState {
    pub unreachable_since: Option<Timestamp>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReachabilityTracker {
    grace_secs: i64,
    force_absent: bool,
    state: ReachabilityState,
    last_effective: Option<bool>,
}

impl ReachabilityTracker {
    pub fn new(grace_period: Duration, force_absent: bool) -> Self {
        Self::restore(grace_period, force_absent, ReachabilityState::default())
    }

    pub fn restore(grace_period: Duration, force_absent: bool, state: ReachabilityState) -> Self {
        Self {
            grace_secs: grace_period.as_secs() as i64,
            force_absent,
            state,
            last_effective: None,
        }
    }

    pub fn state(&self) -> &ReachabilityState {
        &self.state
    }

    /// Classify one poll result.
    ///
    /// `committed` is the state machine's committed state, used as the
    /// previous effective value when this process has not yet seen one.
    pub fn observe<E: Display>(
        &mut self,
        result: Result<bool, E>,
        committed: Option<bool>,
        now: Timestamp,
    ) -> EffectiveSample {
        match result {
            Ok(value) => {
                if let Some(since) = self.state.unreachable_since.take() {
                    info!(
                        unreachable_secs = now - since,
                        "Status source reachable again"
                    );
                }
                self.state.last_error = None;
                self.last_effective = Some(value);
                EffectiveSample::Observed(value)
            }
            Err(e) => {
                let since = *self.state.unreachable_since.get_or_insert_with(|| {
                    warn!(error = %e, "Status source unreachable");
                    now
                });
                self.state.last_error = Some(e.to_string());

                if self.force_absent && now - since >= self.grace_secs {
                    if self.last_effective != Some(false) {
                        warn!(
                            unreachable_secs = now - since,
                            "Grace period expired, treating power as absent"
                        );
                    }
                    self.last_effective = Some(false);
                    return EffectiveSample::ForcedAbsent;
                }

                debug!(error = %e, unreachable_secs = now - since, "Poll failed within grace period");
                match self.last_effective.or(committed) {
                    Some(value) => EffectiveSample::Held(value),
                    None => EffectiveSample::Unavailable,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: Duration = Duration::from_secs(300);

    fn fail() -> Result<bool, &'static str> {
        Err("timeout")
    }

    #[test]
    fn success_clears_failure_streak() {
        let mut tracker = ReachabilityTracker::new(GRACE, true);

        tracker.observe(fail(), Some(true), 10);
        assert_eq!(tracker.state().unreachable_since, Some(10));
        assert_eq!(tracker.state().last_error.as_deref(), Some("timeout"));

        assert_eq!(
            tracker.observe(Ok::<_, &str>(true), Some(true), 20),
            EffectiveSample::Observed(true)
        );
        assert_eq!(tracker.state(), &ReachabilityState::default());
    }

    #[test]
    fn failure_holds_previous_effective_sample() {
        let mut tracker = ReachabilityTracker::new(GRACE, true);

        tracker.observe(Ok::<_, &str>(false), Some(true), 0);

        // The last effective value wins over the committed state.
        assert_eq!(
            tracker.observe(fail(), Some(true), 60),
            EffectiveSample::Held(false)
        );
    }

    #[test]
    fn failure_falls_back_to_committed_state() {
        let mut tracker = ReachabilityTracker::new(GRACE, true);

        assert_eq!(
            tracker.observe(fail(), Some(true), 0),
            EffectiveSample::Held(true)
        );
    }

    #[test]
    fn failure_without_history_is_unavailable() {
        let mut tracker = ReachabilityTracker::new(GRACE, true);

        assert_eq!(
            tracker.observe(fail(), None, 0),
            EffectiveSample::Unavailable
        );
    }

    #[test]
    fn failure_just_under_grace_is_not_forced() {
        let mut tracker = ReachabilityTracker::new(GRACE, true);

        tracker.observe(Ok::<_, &str>(true), None, 0);
        tracker.observe(fail(), Some(true), 1_000);

        assert_eq!(
            tracker.observe(fail(), Some(true), 1_000 + 299),
            EffectiveSample::Held(true)
        );
    }

    #[test]
    fn failure_past_grace_forces_absent() {
        let mut tracker = ReachabilityTracker::new(GRACE, true);

        tracker.observe(Ok::<_, &str>(true), None, 0);
        tracker.observe(fail(), Some(true), 1_000);

        assert_eq!(
            tracker.observe(fail(), Some(true), 1_000 + 301),
            EffectiveSample::ForcedAbsent
        );
        // Stays forced for the rest of the streak.
        assert_eq!(
            tracker.observe(fail(), Some(false), 2_000),
            EffectiveSample::ForcedAbsent
        );
    }

    #[test]
    fn forced_absent_can_be_disabled() {
        let mut tracker = ReachabilityTracker::new(GRACE, false);

        tracker.observe(Ok::<_, &str>(true), None, 0);
        tracker.observe(fail(), Some(true), 1_000);

        assert_eq!(
            tracker.observe(fail(), Some(true), 10_000),
            EffectiveSample::Held(true)
        );
    }

    #[test]
    fn restored_streak_keeps_its_start() {
        let state = ReachabilityState {
            unreachable_since: Some(100),
            last_error: Some("dns".into()),
        };
        let mut tracker = ReachabilityTracker::restore(GRACE, true, state);

        assert_eq!(
            tracker.observe(fail(), Some(true), 400),
            EffectiveSample::ForcedAbsent
        );
    }

    #[test]
    fn effective_values() {
        assert_eq!(EffectiveSample::Observed(true).value(), Some(true));
        assert_eq!(EffectiveSample::Held(false).value(), Some(false));
        assert_eq!(EffectiveSample::ForcedAbsent.value(), Some(false));
        assert_eq!(EffectiveSample::Unavailable.value(), None);
    }
}
