use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// How long a new raw value must hold before it is committed.
    pub debounce: Duration,

    /// How long the source may stay unreachable before power is assumed
    /// absent.
    pub grace_period: Duration,

    /// Closed segments that ended more than this many days ago are pruned.
    pub retention_days: u32,

    /// Treat sustained unreachability as "power absent". When false, the
    /// last effective sample is held for as long as the source stays down.
    pub force_absent_on_unreachable: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(20),
            grace_period: Duration::from_secs(300),
            retention_days: 60,
            force_absent_on_unreachable: true,
        }
    }
}
