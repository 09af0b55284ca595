//! Command-line interface for powerwatch.
//!
//! Queries a running `powerwatchd` through its HTTP API.

use std::env;

use anyhow::{Result, bail};

use powerwatch::api_client;
use powerwatch::summary::SummaryPeriod;

const USAGE: &str = "\
Usage: powerwatch-cli <command>

Commands:
  status         Show the current power state
  day|week|month Summarize the last complete period
  send <text>    Send a chat-style command, e.g. /last

Environment:
  POWERWATCH_API_URL    API base URL (default: http://127.0.0.1:7786)";

#[derive(Debug, PartialEq, Eq)]
enum CliCommand {
    Status,
    Summary(SummaryPeriod),
    Send(String),
}

impl CliCommand {
    fn from_args(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            bail!("missing command");
        };

        match name.as_str() {
            "status" => Ok(CliCommand::Status),
            "send" if rest.is_empty() => bail!("send needs the command text"),
            "send" => Ok(CliCommand::Send(rest.join(" "))),
            other => match other.parse() {
                Ok(period) => Ok(CliCommand::Summary(period)),
                Err(_) => bail!("unknown command: {other}"),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let command = match CliCommand::from_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(1);
        }
    };

    let client = make_client();
    match command {
        CliCommand::Status => print_status(&client).await,
        CliCommand::Summary(period) => {
            let summary = client.get_summary(&period.to_string()).await?;
            println!("{}", summary.text);
            Ok(())
        }
        CliCommand::Send(text) => {
            let reply = client.send_command(&text).await?;
            println!("{}", reply.text);
            Ok(())
        }
    }
}

/// Build an API client, honoring POWERWATCH_API_URL if set.
fn make_client() -> api_client::Client {
    match env::var("POWERWATCH_API_URL") {
        Ok(url) => api_client::Client::with_base_url(url),
        Err(_) => api_client::Client::new(),
    }
}

fn label(state: bool) -> &'static str {
    if state { "ON" } else { "OFF" }
}

async fn print_status(client: &api_client::Client) -> Result<()> {
    let status = client.get_status().await?;

    match status.state {
        Some(state) => println!("State:    {}", label(state)),
        None => println!("State:    unknown"),
    }
    if let Some(secs) = status.state_duration_secs {
        println!("For:      {secs} s");
    }
    if let Some(pending) = status.pending_state {
        println!("Pending:  {}", label(pending));
    }
    if let Some(since) = status.unreachable_since {
        println!("Unreachable since: {since}");
        if let Some(error) = &status.last_error {
            println!("Last error: {error}");
        }
    }
    println!("Uptime:   {} s", status.uptime_secs);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn periods_dispatch_to_summary() {
        assert_eq!(
            CliCommand::from_args(&args(&["week"])).unwrap(),
            CliCommand::Summary(SummaryPeriod::Week)
        );
        assert_eq!(
            CliCommand::from_args(&args(&["month"])).unwrap(),
            CliCommand::Summary(SummaryPeriod::Month)
        );
    }

    #[test]
    fn send_joins_remaining_words() {
        assert_eq!(
            CliCommand::from_args(&args(&["send", "/last", "now"])).unwrap(),
            CliCommand::Send("/last now".into())
        );
        assert!(CliCommand::from_args(&args(&["send"])).is_err());
    }

    #[test]
    fn rejects_unknown_and_missing() {
        assert!(CliCommand::from_args(&args(&["year"])).is_err());
        assert!(CliCommand::from_args(&[]).is_err());
        assert_eq!(
            CliCommand::from_args(&args(&["status"])).unwrap(),
            CliCommand::Status
        );
    }
}
