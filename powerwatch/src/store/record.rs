use serde::{Deserialize, Serialize};

use crate::timeline::Timestamp;

/// The persisted state record, one flat JSON object.
///
/// Field names match the files written by earlier deployments, including
/// the vendor-specific names of the reachability fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateRecord {
    pub online: Option<bool>,

    /// Start of the committed state.
    #[serde(deserialize_with = "crate::timeline::seconds::deserialize_opt")]
    pub timestamp: Option<Timestamp>,

    /// Start of the open log segment.
    #[serde(deserialize_with = "crate::timeline::seconds::deserialize_opt")]
    pub segment_start_time: Option<Timestamp>,

    #[serde(
        rename = "tuya_offline_since",
        deserialize_with = "crate::timeline::seconds::deserialize_opt"
    )]
    pub offline_since: Option<Timestamp>,

    #[serde(rename = "last_tuya_error")]
    pub last_error: Option<String>,

    pub last_rollover_date: Option<String>,
    pub last_daily_summary_date: Option<String>,
    pub last_weekly_summary_date: Option<String>,
    pub last_monthly_summary_date: Option<String>,
}
