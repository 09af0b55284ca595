//! The monitor ties the timeline to its collaborators.
//!
//! All mutable state lives in one [`Core`] behind a single lock, shared by
//! two tasks: the sampler, which polls the source on a fixed interval, and
//! the scheduler, which runs the calendar jobs. Neither holds the lock
//! across an `.await`; polling and notification happen outside it, and
//! every mutation is persisted before the lock is released.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::notify::{Notifier, messages};
use crate::schedule::{Job, RolloverScheduler, ScheduleConfig, SchedulerGuards};
use crate::source::{SampleSource, SourceError};
use crate::store::{StateRecord, Store};
use crate::summary::{Summary, SummaryAggregator, SummaryPeriod};
use crate::timeline::{
    Commit, CurrentState, DebounceStateMachine, EffectiveSample, LogEntry, PendingTransition,
    ReachabilityState, ReachabilityTracker, SegmentLog, StateChanged, TimelineConfig, Timestamp,
};
use crate::tracing::prelude::*;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub timeline: TimelineConfig,
    pub schedule: ScheduleConfig,

    /// Interval between source polls.
    pub check_interval: Duration,

    /// Upper bound on a single poll; a timeout counts as a failure.
    pub poll_timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            timeline: TimelineConfig::default(),
            schedule: ScheduleConfig::default(),
            check_interval: Duration::from_secs(60),
            poll_timeout: Duration::from_secs(10),
        }
    }
}

/// Point-in-time view of the monitor for status queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub current: Option<CurrentState>,
    pub pending: Option<PendingTransition>,
    pub reachability: ReachabilityState,
    pub uptime_secs: i64,
    pub now: Timestamp,
}

impl Status {
    /// How long the committed state has lasted.
    pub fn state_duration_secs(&self) -> Option<i64> {
        self.current
            .map(|current| (self.now - current.state_since).max(0))
    }
}

/// The last committed change and the interval preceding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastChange {
    pub state: bool,
    pub since: Timestamp,
    /// Most recent logged interval in the opposite state.
    pub previous: Option<LogEntry>,
}

/// Everything guarded by the monitor's lock.
struct Core {
    timeline: DebounceStateMachine,
    reachability: ReachabilityTracker,
    guards: SchedulerGuards,
    log: SegmentLog,
    store: Box<dyn Store>,
    /// Set while the last save of the record or the log failed.
    state_dirty: bool,
    log_dirty: bool,
}

impl Core {
    fn load(settings: &MonitorSettings, store: Box<dyn Store>) -> Self {
        let record = store.load_state().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable state record");
            None
        });
        let entries = store.load_log().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable segment log");
            Vec::new()
        });
        let record = record.unwrap_or_default();

        let current = match (record.online, record.timestamp) {
            (Some(state), Some(since)) => Some(CurrentState {
                state,
                state_since: since,
                segment_start: record.segment_start_time.unwrap_or(since).max(since),
            }),
            _ => None,
        };
        let timeline = &settings.timeline;

        info!(
            state = ?current.map(|c| c.state),
            log_entries = entries.len(),
            "Restored monitor state"
        );

        Self {
            timeline: DebounceStateMachine::restore(timeline.debounce, current),
            reachability: ReachabilityTracker::restore(
                timeline.grace_period,
                timeline.force_absent_on_unreachable,
                ReachabilityState {
                    unreachable_since: record.offline_since,
                    last_error: record.last_error,
                },
            ),
            guards: SchedulerGuards {
                last_rollover_date: record.last_rollover_date,
                last_daily_summary_date: record.last_daily_summary_date,
                last_weekly_summary_date: record.last_weekly_summary_date,
                last_monthly_summary_date: record.last_monthly_summary_date,
            },
            log: SegmentLog::from_entries(entries, timeline.retention_days),
            store,
            state_dirty: false,
            log_dirty: false,
        }
    }

    fn state_record(&self) -> StateRecord {
        let current = self.timeline.current();
        let reachability = self.reachability.state();
        StateRecord {
            online: current.map(|c| c.state),
            timestamp: current.map(|c| c.state_since),
            segment_start_time: current.map(|c| c.segment_start),
            offline_since: reachability.unreachable_since,
            last_error: reachability.last_error.clone(),
            last_rollover_date: self.guards.last_rollover_date.clone(),
            last_daily_summary_date: self.guards.last_daily_summary_date.clone(),
            last_weekly_summary_date: self.guards.last_weekly_summary_date.clone(),
            last_monthly_summary_date: self.guards.last_monthly_summary_date.clone(),
        }
    }

    fn persist_state(&mut self) {
        let record = self.state_record();
        self.state_dirty = match self.store.save_state(&record) {
            Ok(()) => false,
            Err(e) => {
                warn!(error = %e, "Failed to persist state, continuing in memory");
                true
            }
        };
    }

    fn persist_log(&mut self) {
        self.log_dirty = match self.store.save_log(self.log.entries()) {
            Ok(()) => false,
            Err(e) => {
                warn!(error = %e, "Failed to persist segment log, continuing in memory");
                true
            }
        };
    }

    fn effective(&mut self, result: Result<bool, SourceError>, now: Timestamp) -> EffectiveSample {
        let committed = self.timeline.current().map(|c| c.state);
        self.reachability.observe(result, committed, now)
    }

    /// Write the closed interval, if any, and hand back the state change.
    fn record(&mut self, commit: Commit, now: Timestamp) -> Option<StateChanged> {
        if let Some(entry) = commit.closed {
            self.log.record(entry, now);
            self.persist_log();
        }
        commit.changed
    }

    fn apply_sample(
        &mut self,
        result: Result<bool, SourceError>,
        now: Timestamp,
    ) -> Option<StateChanged> {
        let before = self.state_record();

        let commit = match self.effective(result, now) {
            EffectiveSample::Observed(value) | EffectiveSample::Held(value) => {
                self.timeline.on_sample(value, now)
            }
            EffectiveSample::ForcedAbsent => self.timeline.force(false, now),
            EffectiveSample::Unavailable => None,
        };
        let changed = commit.and_then(|commit| self.record(commit, now));

        if self.log_dirty {
            self.persist_log();
        }
        if self.state_dirty || self.state_record() != before {
            self.persist_state();
        }
        changed
    }

    fn rollover(
        &mut self,
        result: Option<Result<bool, SourceError>>,
        now: Timestamp,
    ) -> Option<StateChanged> {
        let sample = match result {
            Some(result) => self.effective(result, now).value(),
            None => None,
        };
        let commit = self.timeline.rollover(sample, now);
        info!(
            sample = ?sample,
            closed_secs = ?commit.closed.map(|e| e.duration_secs),
            "Daily rollover"
        );
        self.record(commit, now)
    }
}

/// Handle to the running monitor. Clones share the same state.
#[derive(Clone)]
pub struct Monitor {
    core: Arc<Mutex<Core>>,
    source: Arc<dyn SampleSource>,
    notifier: Arc<dyn Notifier>,
    scheduler: RolloverScheduler,
    aggregator: SummaryAggregator,
    check_interval: Duration,
    poll_timeout: Duration,
    started_at: Timestamp,
}

impl Monitor {
    /// Build a monitor, restoring whatever `store` holds.
    pub fn new(
        settings: MonitorSettings,
        store: Box<dyn Store>,
        source: Arc<dyn SampleSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let core = Core::load(&settings, store);
        Self {
            core: Arc::new(Mutex::new(core)),
            source,
            notifier,
            aggregator: SummaryAggregator::new(settings.schedule.utc_offset),
            scheduler: RolloverScheduler::new(settings.schedule),
            check_interval: settings.check_interval,
            poll_timeout: settings.poll_timeout,
            started_at: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }

    pub fn aggregator(&self) -> &SummaryAggregator {
        &self.aggregator
    }

    /// Poll the source on a fixed interval until cancelled.
    pub async fn run_sampler(self, cancellation: CancellationToken) {
        let mut interval = tokio::time::interval(self.check_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        debug!(interval = ?self.check_interval, "Sampler started");
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    break;
                }
                _ = interval.tick() => {
                    self.sample_tick(OffsetDateTime::now_utc().unix_timestamp()).await;
                }
            }
        }
        debug!("Sampler stopped");
    }

    /// Check for due calendar jobs until cancelled.
    pub async fn run_scheduler(self, cancellation: CancellationToken) {
        let mut interval = tokio::time::interval(self.scheduler.config().tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        debug!("Scheduler started");
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    break;
                }
                _ = interval.tick() => {
                    self.schedule_tick(OffsetDateTime::now_utc()).await;
                }
            }
        }
        debug!("Scheduler stopped");
    }

    /// Take one sample and feed it through the timeline.
    pub async fn sample_tick(&self, now: Timestamp) {
        let result = self.poll_source().await;
        if let Ok(value) = &result {
            trace!(online = value, "Polled source");
        }

        let changed = {
            let mut core = self.core.lock();
            core.apply_sample(result, now)
        };

        if let Some(event) = changed {
            info!(
                old_state = event.old_state,
                new_state = event.new_state,
                duration_s = event.duration_secs,
                "Power state changed"
            );
            self.notify(&messages::state_changed(&event, self.aggregator.offset()))
                .await;
        }
    }

    /// Run whichever calendar jobs are due at `now`.
    pub async fn schedule_tick(&self, now: OffsetDateTime) {
        let due = {
            let core = self.core.lock();
            self.scheduler.due_jobs(&core.guards, now)
        };
        if due.is_empty() {
            return;
        }

        let mut poll = if due.contains(&Job::Rollover) {
            Some(self.poll_source().await)
        } else {
            None
        };

        let today = self.scheduler.today(now);
        let ts = now.unix_timestamp();
        let mut outbox = Vec::new();
        {
            let mut core = self.core.lock();
            // Re-read the guards: only jobs still due under the lock run.
            for job in self.scheduler.due_jobs(&core.guards, now) {
                match job {
                    Job::Rollover => {
                        if let Some(event) = core.rollover(poll.take(), ts) {
                            outbox.push(messages::state_changed(&event, self.aggregator.offset()));
                        }
                    }
                    Job::Summary(period) => {
                        let summary = self.aggregator.summarize(&core.log, period, now);
                        info!(
                            period = %period,
                            present_s = summary.totals.present_secs,
                            absent_s = summary.totals.absent_secs,
                            "Summary computed"
                        );
                        outbox.push(messages::summary(&summary, self.aggregator.offset()));
                    }
                }
                core.guards.mark(job, today);
            }
            core.persist_state();
        }

        for text in outbox {
            self.notify(&text).await;
        }
    }

    pub fn status(&self, now: Timestamp) -> Status {
        let core = self.core.lock();
        Status {
            current: core.timeline.current(),
            pending: core.timeline.pending(),
            reachability: core.reachability.state().clone(),
            uptime_secs: self.uptime_secs(now),
            now,
        }
    }

    pub fn last_change(&self) -> Option<LastChange> {
        let core = self.core.lock();
        let current = core.timeline.current()?;
        Some(LastChange {
            state: current.state,
            since: current.state_since,
            previous: core.log.last_in_state(!current.state).copied(),
        })
    }

    /// Summary of the last complete `period` before `now`.
    pub fn summary(&self, period: SummaryPeriod, now: OffsetDateTime) -> Summary {
        let core = self.core.lock();
        self.aggregator.summarize(&core.log, period, now)
    }

    pub fn uptime_secs(&self, now: Timestamp) -> i64 {
        (now - self.started_at).max(0)
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.core.lock().log.entries().to_vec()
    }

    async fn poll_source(&self) -> Result<bool, SourceError> {
        match tokio::time::timeout(self.poll_timeout, self.source.poll()).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.poll_timeout)),
        }
    }

    async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            warn!(error = %e, "Failed to deliver notification");
        }
    }
}
