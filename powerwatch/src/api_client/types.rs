//! API data transfer objects.
//!
//! These types define the API contract shared between the server and
//! clients. Timestamps are Unix seconds.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Snapshot of the monitored power state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct StatusReport {
    /// Committed state, `true` when power is present. Absent until the
    /// first successful poll.
    pub state: Option<bool>,
    pub state_since: Option<i64>,
    pub state_duration_secs: Option<i64>,
    /// Start of the open log segment, advanced by the daily rollover.
    pub segment_start: Option<i64>,
    /// Unconfirmed flip awaiting the debounce window.
    pub pending_state: Option<bool>,
    pub pending_since: Option<i64>,
    pub unreachable_since: Option<i64>,
    pub last_error: Option<String>,
    pub uptime_secs: i64,
}

/// Time-in-state totals for the last complete period.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct SummaryReport {
    /// `day`, `week` or `month`.
    pub period: String,
    /// Inclusive range start.
    pub start: i64,
    /// Exclusive range end.
    pub end: i64,
    pub present_secs: i64,
    pub absent_secs: i64,
    /// Human-readable rendering, as sent to the notifier.
    pub text: String,
}

/// Inbound command text, e.g. `/status`.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct CommandRequest {
    pub text: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct CommandReply {
    pub text: String,
}
