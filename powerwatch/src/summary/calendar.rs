//! Calendar ranges in the reporting timezone.
//!
//! All ranges are half-open `[start, end)` pairs of Unix timestamps whose
//! bounds fall on local midnights.

use time::{Date, Duration, OffsetDateTime, Time, UtcOffset};

use crate::timeline::Timestamp;

/// The local calendar date of `now`.
pub fn local_date(now: OffsetDateTime, offset: UtcOffset) -> Date {
    now.to_offset(offset).date()
}

/// Unix timestamp of the local midnight starting `date`.
pub fn local_midnight(date: Date, offset: UtcOffset) -> Timestamp {
    date.with_time(Time::MIDNIGHT)
        .assume_offset(offset)
        .unix_timestamp()
}

/// Yesterday, from local midnight to local midnight.
pub fn previous_day_range(now: OffsetDateTime, offset: UtcOffset) -> (Timestamp, Timestamp) {
    let today = local_date(now, offset);
    let yesterday = today.saturating_sub(Duration::DAY);
    (local_midnight(yesterday, offset), local_midnight(today, offset))
}

/// The last complete Monday-to-Monday week.
pub fn previous_week_range(now: OffsetDateTime, offset: UtcOffset) -> (Timestamp, Timestamp) {
    let today = local_date(now, offset);
    let this_monday =
        today.saturating_sub(Duration::days(today.weekday().number_days_from_monday().into()));
    let last_monday = this_monday.saturating_sub(Duration::WEEK);
    (
        local_midnight(last_monday, offset),
        local_midnight(this_monday, offset),
    )
}

/// The last complete calendar month.
pub fn previous_month_range(now: OffsetDateTime, offset: UtcOffset) -> (Timestamp, Timestamp) {
    let today = local_date(now, offset);
    let this_first = first_of_month(today);
    let previous_first = first_of_month(this_first.saturating_sub(Duration::DAY));
    (
        local_midnight(previous_first, offset),
        local_midnight(this_first, offset),
    )
}

fn first_of_month(date: Date) -> Date {
    date.saturating_sub(Duration::days(i64::from(date.day()) - 1))
}
