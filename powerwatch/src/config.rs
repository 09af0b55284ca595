//! Process configuration from `POWERWATCH_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use time::macros::format_description;
use time::{Time, UtcOffset};

use crate::monitor::MonitorSettings;
use crate::schedule::ScheduleConfig;
use crate::timeline::TimelineConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Status endpoint polled for the device's reachability.
    pub url: String,

    /// JSON pointer to the boolean "online" flag in the response.
    pub pointer: String,

    /// Optional bearer token sent with each poll.
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceConfig,

    /// Webhook receiving notifications. Without one, notifications are
    /// only logged.
    pub notify_url: Option<String>,

    /// Directory holding `state.json` and `log.json`.
    pub data_dir: PathBuf,

    pub monitor: MonitorSettings,

    pub api_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let source = SourceConfig {
            url: var("POWERWATCH_SOURCE_URL").ok_or(ConfigError::Missing("POWERWATCH_SOURCE_URL"))?,
            pointer: var("POWERWATCH_SOURCE_POINTER").unwrap_or_else(|| "/online".to_string()),
            token: var("POWERWATCH_SOURCE_TOKEN"),
        };

        let timeline_defaults = TimelineConfig::default();
        let timeline = TimelineConfig {
            debounce: secs(&var, "POWERWATCH_DEBOUNCE_SECS", timeline_defaults.debounce)?,
            grace_period: secs(&var, "POWERWATCH_GRACE_SECS", timeline_defaults.grace_period)?,
            retention_days: parse(
                &var,
                "POWERWATCH_RETENTION_DAYS",
                timeline_defaults.retention_days,
            )?,
            force_absent_on_unreachable: parse(
                &var,
                "POWERWATCH_FORCE_ABSENT_ON_UNREACHABLE",
                timeline_defaults.force_absent_on_unreachable,
            )?,
        };

        let schedule_defaults = ScheduleConfig::default();
        let schedule = ScheduleConfig {
            utc_offset: match var("POWERWATCH_UTC_OFFSET") {
                Some(value) => parse_offset(&value)?,
                None => schedule_defaults.utc_offset,
            },
            rollover_at: match var("POWERWATCH_ROLLOVER_AT") {
                Some(value) => parse_time(&value)?,
                None => schedule_defaults.rollover_at,
            },
            trigger_window: nonzero_secs(
                &var,
                "POWERWATCH_ROLLOVER_WINDOW_SECS",
                schedule_defaults.trigger_window,
            )?,
            tick: schedule_defaults.tick,
        };
        check_window(&schedule)?;

        let monitor_defaults = MonitorSettings::default();
        let monitor = MonitorSettings {
            timeline,
            schedule,
            check_interval: nonzero_secs(
                &var,
                "POWERWATCH_CHECK_INTERVAL_SECS",
                monitor_defaults.check_interval,
            )?,
            poll_timeout: nonzero_secs(
                &var,
                "POWERWATCH_POLL_TIMEOUT_SECS",
                monitor_defaults.poll_timeout,
            )?,
        };

        Ok(Self {
            source,
            notify_url: var("POWERWATCH_NOTIFY_URL"),
            data_dir: var("POWERWATCH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            monitor,
            api_addr: parse(
                &var,
                "POWERWATCH_API_ADDR",
                SocketAddr::from(([127, 0, 0, 1], 7786)),
            )?,
        })
    }
}

fn parse<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn secs(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    parse(var, name, default.as_secs()).map(Duration::from_secs)
}

fn nonzero_secs(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match secs(var, name, default)? {
        d if d.is_zero() => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        }),
        d => Ok(d),
    }
}

/// The trigger window must close before the next local midnight.
fn check_window(schedule: &ScheduleConfig) -> Result<(), ConfigError> {
    let (h, m, s) = schedule.rollover_at.as_hms();
    let opens = u64::from(h) * 3600 + u64::from(m) * 60 + u64::from(s);
    if opens + schedule.trigger_window.as_secs() > 86_400 {
        return Err(ConfigError::Invalid {
            name: "POWERWATCH_ROLLOVER_WINDOW_SECS",
            value: schedule.trigger_window.as_secs().to_string(),
        });
    }
    Ok(())
}

fn parse_offset(value: &str) -> Result<UtcOffset, ConfigError> {
    UtcOffset::parse(
        value.trim(),
        format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
    )
    .map_err(|_| ConfigError::Invalid {
        name: "POWERWATCH_UTC_OFFSET",
        value: value.to_string(),
    })
}

fn parse_time(value: &str) -> Result<Time, ConfigError> {
    Time::parse(value.trim(), format_description!("[hour]:[minute]")).map_err(|_| {
        ConfigError::Invalid {
            name: "POWERWATCH_ROLLOVER_AT",
            value: value.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;
    use time::macros::{offset, time};

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn source_url_is_required() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("POWERWATCH_SOURCE_URL"))
        ));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[(
            "POWERWATCH_SOURCE_URL",
            "http://device.local/status",
        )]))
        .unwrap();

        assert_eq!(config.source.pointer, "/online");
        assert_eq!(config.source.token, None);
        assert_eq!(config.notify_url, None);
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.monitor.check_interval, Duration::from_secs(60));
        assert_eq!(config.monitor.timeline.debounce, Duration::from_secs(20));
        assert_eq!(config.monitor.timeline.retention_days, 60);
        assert!(config.monitor.timeline.force_absent_on_unreachable);
        assert_eq!(config.monitor.schedule.utc_offset, UtcOffset::UTC);
        assert_eq!(config.api_addr, SocketAddr::from(([127, 0, 0, 1], 7786)));
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_lookup(lookup(&[
            ("POWERWATCH_SOURCE_URL", "http://device.local/status"),
            ("POWERWATCH_SOURCE_POINTER", "/result/online"),
            ("POWERWATCH_NOTIFY_URL", "http://chat.local/hook"),
            ("POWERWATCH_DEBOUNCE_SECS", "45"),
            ("POWERWATCH_GRACE_SECS", "600"),
            ("POWERWATCH_FORCE_ABSENT_ON_UNREACHABLE", "false"),
            ("POWERWATCH_UTC_OFFSET", "+02:00"),
            ("POWERWATCH_ROLLOVER_AT", "00:10"),
            ("POWERWATCH_API_ADDR", "0.0.0.0:9000"),
        ]))
        .unwrap();

        assert_eq!(config.source.pointer, "/result/online");
        assert_eq!(config.notify_url.as_deref(), Some("http://chat.local/hook"));
        assert_eq!(config.monitor.timeline.debounce, Duration::from_secs(45));
        assert_eq!(config.monitor.timeline.grace_period, Duration::from_secs(600));
        assert!(!config.monitor.timeline.force_absent_on_unreachable);
        assert_eq!(config.monitor.schedule.utc_offset, offset!(+2));
        assert_eq!(config.monitor.schedule.rollover_at, time!(00:10));
        assert_eq!(config.api_addr.port(), 9000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("POWERWATCH_SOURCE_URL", "http://device.local/status"),
            ("POWERWATCH_UTC_OFFSET", "Europe/Kyiv"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "POWERWATCH_UTC_OFFSET",
                ..
            })
        ));

        let result = Config::from_lookup(lookup(&[
            ("POWERWATCH_SOURCE_URL", "http://device.local/status"),
            ("POWERWATCH_DEBOUNCE_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test_case("POWERWATCH_CHECK_INTERVAL_SECS", "0")]
    #[test_case("POWERWATCH_POLL_TIMEOUT_SECS", "0")]
    #[test_case("POWERWATCH_ROLLOVER_WINDOW_SECS", "0")]
    fn zero_durations_are_rejected(name: &'static str, value: &str) {
        let result = Config::from_lookup(lookup(&[
            ("POWERWATCH_SOURCE_URL", "http://device.local/status"),
            (name, value),
        ]));

        assert!(matches!(result, Err(ConfigError::Invalid { name: n, .. }) if n == name));
    }

    #[test]
    fn trigger_window_must_not_cross_midnight() {
        let result = Config::from_lookup(lookup(&[
            ("POWERWATCH_SOURCE_URL", "http://device.local/status"),
            ("POWERWATCH_ROLLOVER_AT", "23:58"),
            ("POWERWATCH_ROLLOVER_WINDOW_SECS", "240"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "POWERWATCH_ROLLOVER_WINDOW_SECS",
                ..
            })
        ));

        let config = Config::from_lookup(lookup(&[
            ("POWERWATCH_SOURCE_URL", "http://device.local/status"),
            ("POWERWATCH_ROLLOVER_AT", "23:56"),
            ("POWERWATCH_ROLLOVER_WINDOW_SECS", "240"),
        ]))
        .unwrap();
        assert_eq!(config.monitor.schedule.trigger_window, Duration::from_secs(240));
    }
}
