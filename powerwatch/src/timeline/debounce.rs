//! Debounced commit of the observed power state.
//!
//! A raw sample that disagrees with the committed state opens a candidate.
//! The candidate is committed only once the same value has been seen again
//! at least `debounce` after the candidate opened. Any sample matching the
//! committed state abandons the candidate.
//!
//! # State Machine
//!
//! ```text
//!              sample != state                 same candidate,
//!   Settled ────────────────────► Pending ─────────────────────────► commit
//!      ▲                             │      elapsed >= debounce        │
//!      │       sample == state       │                                 │
//!      └─────────────────────────────┘                                 │
//!      ▲                                                               │
//!      └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! A forced sample skips the pending stage and commits at once. Rollover
//! closes the open segment without waiting for a state change.

use std::time::Duration;

use super::Timestamp;
use super::segment_log::LogEntry;

/// The committed state and the start of the open log interval.
///
/// `state_since` marks when the committed state began. `segment_start`
/// marks the start of the interval that has not yet been written to the
/// log; rollover moves it forward without touching `state_since`, so
/// `state_since <= segment_start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentState {
    pub state: bool,
    pub state_since: Timestamp,
    pub segment_start: Timestamp,
}

impl CurrentState {
    fn starting(state: bool, at: Timestamp) -> Self {
        Self {
            state,
            state_since: at,
            segment_start: at,
        }
    }
}

/// An unconfirmed flip awaiting debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    pub candidate_state: bool,
    pub candidate_since: Timestamp,
}

/// A committed change of the power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChanged {
    pub old_state: bool,
    pub new_state: bool,
    /// How long `old_state` lasted, in seconds.
    pub duration_secs: i64,
    pub at: Timestamp,
}

/// Side effects of a commit or a rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Commit {
    /// The interval closed by this commit, if it was non-empty.
    pub closed: Option<LogEntry>,

    /// Set when the committed state flipped.
    pub changed: Option<StateChanged>,
}

#[derive(Debug, Clone)]
pub struct DebounceStateMachine {
    debounce_secs: i64,
    current: Option<CurrentState>,
    pending: Option<PendingTransition>,
}

impl DebounceStateMachine {
    pub fn new(debounce: Duration) -> Self {
        Self::restore(debounce, None)
    }

    /// Resume from a persisted state. Pending candidates are never
    /// persisted, so a restart always starts without one.
    pub fn restore(debounce: Duration, current: Option<CurrentState>) -> Self {
        Self {
            debounce_secs: debounce.as_secs() as i64,
            current,
            pending: None,
        }
    }

    pub fn current(&self) -> Option<CurrentState> {
        self.current
    }

    pub fn pending(&self) -> Option<PendingTransition> {
        self.pending
    }

    /// Feed one effective sample.
    ///
    /// | Committed | Pending | sample | Result |
    /// |-----------|---------|--------|--------|
    /// | none | - | any | initialize, no commit |
    /// | s | any | s | clear pending |
    /// | s | none or other | !s | open candidate |
    /// | s | !s, young | !s | wait |
    /// | s | !s, aged | !s | commit |
    pub fn on_sample(&mut self, sample: bool, now: Timestamp) -> Option<Commit> {
        let Some(current) = self.current else {
            self.current = Some(CurrentState::starting(sample, now));
            return None;
        };

        if sample == current.state {
            self.pending = None;
            return None;
        }

        match self.pending {
            Some(pending) if pending.candidate_state == sample => {
                if now - pending.candidate_since >= self.debounce_secs {
                    Some(self.commit(current, sample, now))
                } else {
                    None
                }
            }
            _ => {
                self.pending = Some(PendingTransition {
                    candidate_state: sample,
                    candidate_since: now,
                });
                None
            }
        }
    }

    /// Commit `sample` immediately if it differs from the committed state.
    ///
    /// Used for the post-grace-period "absent" signal, which has already
    /// been stable for longer than any debounce window.
    pub fn force(&mut self, sample: bool, now: Timestamp) -> Option<Commit> {
        let Some(current) = self.current else {
            self.current = Some(CurrentState::starting(sample, now));
            return None;
        };

        self.pending = None;
        if sample == current.state {
            return None;
        }
        Some(self.commit(current, sample, now))
    }

    /// Close the open segment at `now` and open a fresh one.
    ///
    /// When `sample` differs from the committed state the flip is committed
    /// right away. Otherwise only `segment_start` advances, so the status
    /// duration keeps counting from the true start of the ongoing state.
    /// Without a sample the committed state is carried over.
    pub fn rollover(&mut self, sample: Option<bool>, now: Timestamp) -> Commit {
        let Some(current) = self.current else {
            if let Some(sample) = sample {
                self.current = Some(CurrentState::starting(sample, now));
            }
            return Commit::default();
        };

        let sample = sample.unwrap_or(current.state);
        if sample != current.state {
            return self.commit(current, sample, now);
        }

        self.pending = None;
        self.current = Some(CurrentState {
            segment_start: now.max(current.segment_start),
            ..current
        });
        Commit {
            closed: LogEntry::closing(current.state, current.segment_start, now),
            changed: None,
        }
    }

    fn commit(&mut self, current: CurrentState, new_state: bool, now: Timestamp) -> Commit {
        // A caller holding an older clock reading must not move time backwards.
        let now = now.max(current.segment_start);
        self.current = Some(CurrentState::starting(new_state, now));
        self.pending = None;
        Commit {
            closed: LogEntry::closing(current.state, current.segment_start, now),
            changed: Some(StateChanged {
                old_state: current.state,
                new_state,
                duration_secs: now - current.state_since,
                at: now,
            }),
        }
    }
}
