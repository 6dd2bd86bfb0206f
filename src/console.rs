//! Line commands read from stdin while the dashboard runs.

use anyhow::{anyhow, bail, Result};

use kafkawatch_types::TimeDuration;

pub const HELP: &str = "commands: r (refresh) | d <5m|15m|30m|1h|3h|6h|12h|1d|2d|7d> | t <topic> | t - (all topics) | q (quit)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Duration(TimeDuration),
    /// `None` clears the topic filter.
    Topic(Option<String>),
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();
    if parts.next().is_some() {
        bail!("too many arguments; {}", HELP);
    }

    let command = match (verb, arg) {
        ("r" | "refresh", None) => Command::Refresh,
        ("q" | "quit" | "exit", None) => Command::Quit,
        ("h" | "help" | "?", None) => Command::Help,
        ("d" | "duration", Some(value)) => Command::Duration(
            value
                .parse()
                .map_err(|e| anyhow!("{}; {}", e, HELP))?,
        ),
        ("t" | "topic", Some("-")) => Command::Topic(None),
        ("t" | "topic", Some(topic)) => Command::Topic(Some(topic.to_string())),
        _ => bail!("unknown command '{}'; {}", line.trim(), HELP),
    };
    Ok(Some(command))
}
