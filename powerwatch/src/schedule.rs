//! Calendar-triggered jobs: the daily rollover and the periodic summaries.
//!
//! The scheduler loop wakes every few seconds. Jobs become due only inside
//! a short trigger window after the configured local time, and each job
//! records the local date it last ran on. Firing several times inside the
//! window therefore runs every job at most once per day.

use std::time::Duration;

use time::macros::time;
use time::{Date, OffsetDateTime, Time, UtcOffset, Weekday};

use crate::summary::{SummaryPeriod, local_date};

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Offset of the reporting timezone.
    pub utc_offset: UtcOffset,

    /// Local time at which the trigger window opens. Must leave room for
    /// `trigger_window` before the next midnight.
    pub rollover_at: Time,

    /// How long after `rollover_at` the jobs may still fire.
    pub trigger_window: Duration,

    /// How often the scheduler loop checks for due jobs.
    pub tick: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset: UtcOffset::UTC,
            rollover_at: time!(00:01),
            trigger_window: Duration::from_secs(4 * 60),
            tick: Duration::from_secs(30),
        }
    }
}

/// Local dates on which each job last ran, formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerGuards {
    pub last_rollover_date: Option<String>,
    pub last_daily_summary_date: Option<String>,
    pub last_weekly_summary_date: Option<String>,
    pub last_monthly_summary_date: Option<String>,
}

impl SchedulerGuards {
    fn slot(&self, job: Job) -> &Option<String> {
        match job {
            Job::Rollover => &self.last_rollover_date,
            Job::Summary(SummaryPeriod::Day) => &self.last_daily_summary_date,
            Job::Summary(SummaryPeriod::Week) => &self.last_weekly_summary_date,
            Job::Summary(SummaryPeriod::Month) => &self.last_monthly_summary_date,
        }
    }

    fn slot_mut(&mut self, job: Job) -> &mut Option<String> {
        match job {
            Job::Rollover => &mut self.last_rollover_date,
            Job::Summary(SummaryPeriod::Day) => &mut self.last_daily_summary_date,
            Job::Summary(SummaryPeriod::Week) => &mut self.last_weekly_summary_date,
            Job::Summary(SummaryPeriod::Month) => &mut self.last_monthly_summary_date,
        }
    }

    pub fn ran_on(&self, job: Job, date: Date) -> bool {
        self.slot(job).as_deref() == Some(date.to_string().as_str())
    }

    pub fn mark(&mut self, job: Job, date: Date) {
        *self.slot_mut(job) = Some(date.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Rollover,
    Summary(SummaryPeriod),
}

#[derive(Debug, Clone)]
pub struct RolloverScheduler {
    config: ScheduleConfig,
}

impl RolloverScheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn in_window(&self, now: OffsetDateTime) -> bool {
        let local = now.to_offset(self.config.utc_offset).time();
        let opens = seconds_of_day(self.config.rollover_at);
        let at = seconds_of_day(local);
        at >= opens && at - opens < self.config.trigger_window.as_secs()
    }

    /// Jobs that should run at `now`, in execution order. Rollover always
    /// comes first so summaries see the previous day's closed segment.
    pub fn due_jobs(&self, guards: &SchedulerGuards, now: OffsetDateTime) -> Vec<Job> {
        if !self.in_window(now) {
            return Vec::new();
        }

        let today = local_date(now, self.config.utc_offset);
        let mut candidates = vec![Job::Rollover, Job::Summary(SummaryPeriod::Day)];
        if today.weekday() == Weekday::Monday {
            candidates.push(Job::Summary(SummaryPeriod::Week));
        }
        if today.day() == 1 {
            candidates.push(Job::Summary(SummaryPeriod::Month));
        }

        candidates
            .into_iter()
            .filter(|job| !guards.ran_on(*job, today))
            .collect()
    }

    pub fn today(&self, now: OffsetDateTime) -> Date {
        local_date(now, self.config.utc_offset)
    }
}

fn seconds_of_day(t: Time) -> u64 {
    u64::from(t.hour()) * 3600 + u64::from(t.minute()) * 60 + u64::from(t.second())
}
