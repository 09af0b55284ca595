//! Calendar-aligned time-in-state summaries.

mod calendar;

pub use calendar::{
    local_date, local_midnight, previous_day_range, previous_month_range, previous_week_range,
};

use strum::{Display, EnumIter, EnumString};
use time::{OffsetDateTime, UtcOffset};

use crate::timeline::{SegmentLog, StateTotals, Timestamp};

/// A reporting period, always the last complete one before "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum SummaryPeriod {
    Day,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub period: SummaryPeriod,
    pub start: Timestamp,
    pub end: Timestamp,
    pub totals: StateTotals,
}

/// Computes summaries in a fixed reporting timezone.
#[derive(Debug, Clone, Copy)]
pub struct SummaryAggregator {
    offset: UtcOffset,
}

impl SummaryAggregator {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn range(&self, period: SummaryPeriod, now: OffsetDateTime) -> (Timestamp, Timestamp) {
        match period {
            SummaryPeriod::Day => previous_day_range(now, self.offset),
            SummaryPeriod::Week => previous_week_range(now, self.offset),
            SummaryPeriod::Month => previous_month_range(now, self.offset),
        }
    }

    pub fn summarize(
        &self,
        log: &SegmentLog,
        period: SummaryPeriod,
        now: OffsetDateTime,
    ) -> Summary {
        let (start, end) = self.range(period, now);
        Summary {
            period,
            start,
            end,
            totals: log.summarize_range(start, end),
        }
    }
}
