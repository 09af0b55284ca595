//! User commands and their text replies.

use std::str::FromStr;

use time::OffsetDateTime;

use crate::monitor::Monitor;
use crate::notify::messages::{format_duration, format_local, state_label, summary};
use crate::summary::SummaryPeriod;

pub const HELP: &str = "Commands:\n\
    /status - current power state\n\
    /last - last change\n\
    /day - yesterday's summary\n\
    /week - last week's summary\n\
    /month - last month's summary\n\
    /uptime - monitor uptime";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    Last,
    Summary(SummaryPeriod),
    Uptime,
    Help,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    /// Accepts `/status`, `status` and chat-style `/status@botname`, with
    /// any trailing arguments ignored.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let word = text.split_whitespace().next().unwrap_or_default();
        let name = word.trim_start_matches('/');
        let name = name.split('@').next().unwrap_or_default();

        match name.to_ascii_lowercase().as_str() {
            "status" => Ok(Command::Status),
            "last" => Ok(Command::Last),
            "day" => Ok(Command::Summary(SummaryPeriod::Day)),
            "week" => Ok(Command::Summary(SummaryPeriod::Week)),
            "month" => Ok(Command::Summary(SummaryPeriod::Month)),
            "uptime" => Ok(Command::Uptime),
            "help" | "start" => Ok(Command::Help),
            _ => Err(UnknownCommand(word.to_string())),
        }
    }
}

/// Reply to raw command text. Unknown commands get the help text.
pub fn handle(monitor: &Monitor, text: &str, now: OffsetDateTime) -> String {
    match text.parse() {
        Ok(command) => respond(monitor, command, now),
        Err(UnknownCommand(word)) => format!("Unknown command {word:?}\n\n{HELP}"),
    }
}

pub fn respond(monitor: &Monitor, command: Command, now: OffsetDateTime) -> String {
    let offset = monitor.aggregator().offset();
    let ts = now.unix_timestamp();

    match command {
        Command::Status => {
            let status = monitor.status(ts);
            let Some(current) = status.current else {
                return "State unknown yet, no successful poll so far".to_string();
            };
            let mut text = format!(
                "Power is {} for {} (since {})",
                state_label(current.state),
                format_duration(ts - current.state_since),
                format_local(current.state_since, offset),
            );
            if let Some(pending) = status.pending {
                text.push_str(&format!(
                    "\nPossibly {} since {}, confirming",
                    state_label(pending.candidate_state),
                    format_local(pending.candidate_since, offset),
                ));
            }
            if let Some(since) = status.reachability.unreachable_since {
                text.push_str(&format!(
                    "\nSource unreachable since {}",
                    format_local(since, offset)
                ));
            }
            text
        }
        Command::Last => match monitor.last_change() {
            None => "No state recorded yet".to_string(),
            Some(last) => {
                let mut text = format!(
                    "Last change: {} at {}",
                    state_label(last.state),
                    format_local(last.since, offset),
                );
                if let Some(previous) = last.previous {
                    text.push_str(&format!(
                        "\nBefore that it was {} for {}",
                        state_label(previous.state),
                        format_duration(previous.duration_secs),
                    ));
                }
                text
            }
        },
        Command::Summary(period) => summary(&monitor.summary(period, now), offset),
        Command::Uptime => format!("Monitor uptime: {}", format_duration(monitor.uptime_secs(ts))),
        Command::Help => HELP.to_string(),
    }
}
