//! Text of the messages sent to the user.

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::summary::{Summary, SummaryPeriod};
use crate::timeline::{StateChanged, Timestamp};

/// `HH:MM:SS`, with hours growing past two digits as needed.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// `YYYY-MM-DD HH:MM:SS` in the reporting timezone.
pub fn format_local(at: Timestamp, offset: UtcOffset) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::from_unix_timestamp(at)
        .ok()
        .and_then(|t| t.to_offset(offset).format(format).ok())
        .unwrap_or_else(|| at.to_string())
}

fn date_only(at: Timestamp, offset: UtcOffset) -> String {
    OffsetDateTime::from_unix_timestamp(at)
        .map(|t| t.to_offset(offset).date().to_string())
        .unwrap_or_else(|_| at.to_string())
}

pub fn state_label(state: bool) -> &'static str {
    if state { "ON" } else { "OFF" }
}

pub fn state_changed(event: &StateChanged, offset: UtcOffset) -> String {
    let headline = if event.new_state {
        "Power is back"
    } else {
        "Power is out"
    };
    format!(
        "{headline} ({})\nIt was {} for {}",
        format_local(event.at, offset),
        state_label(event.old_state),
        format_duration(event.duration_secs),
    )
}

pub fn summary(summary: &Summary, offset: UtcOffset) -> String {
    let title = match summary.period {
        SummaryPeriod::Day => format!("Daily summary for {}", date_only(summary.start, offset)),
        SummaryPeriod::Week => format!(
            "Weekly summary {} to {}",
            date_only(summary.start, offset),
            date_only(summary.end - 1, offset)
        ),
        SummaryPeriod::Month => format!(
            "Monthly summary for {}",
            date_only(summary.start, offset)
                .get(..7)
                .map(str::to_owned)
                .unwrap_or_default()
        ),
    };

    let totals = summary.totals;
    let total = totals.total_secs();
    if total == 0 {
        return format!("{title}\nNo recorded data");
    }

    format!(
        "{title}\nON:  {} ({:.1}%)\nOFF: {} ({:.1}%)",
        format_duration(totals.present_secs),
        percent(totals.present_secs, total),
        format_duration(totals.absent_secs),
        percent(totals.absent_secs, total),
    )
}

fn percent(part: i64, total: i64) -> f64 {
    part as f64 * 100.0 / total as f64
}
