//! Serde helpers for timestamps and durations stored as JSON numbers.
//!
//! Older state files carry fractional seconds; they are truncated.

use serde::{Deserialize, Deserializer};

pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(|secs| secs as i64)
}

pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(|secs| secs.map(|s| s as i64))
}
