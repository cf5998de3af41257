//! Command Handler
//!
//! Executes parsed commands against the cache and renders the
//! human-readable replies the REPL prints. This is the only place where
//! monotonic log timestamps meet the wall clock: replay output samples a
//! `(Instant, Local)` pair once and offsets every record against it.

use crate::protocol::{self, Command, ParseError};
use crate::storage::{Cache, LogRecord};
use chrono::{DateTime, Local};
use std::time::Instant;

/// What a dispatched command produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Lines to print; empty for commands with no output (a successful SET,
    /// a blank line).
    Reply(Vec<String>),
    /// EXIT was requested; the caller shuts the cache down.
    Exit,
}

/// Dispatches commands to the cache and formats responses.
#[derive(Debug)]
pub struct CommandHandler {
    cache: Cache,
}

impl CommandHandler {
    /// Creates a handler owning the given cache.
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Parses and executes one line of input.
    pub fn execute(&self, line: &str) -> Outcome {
        let command = match protocol::parse(line) {
            Ok(command) => command,
            Err(ParseError::Empty) => return Outcome::Reply(Vec::new()),
            Err(err) => return Outcome::Reply(vec![err.to_string()]),
        };

        match command {
            Command::Set { key, entry } => {
                self.cache.set(key, entry);
                Outcome::Reply(Vec::new())
            }
            Command::Get { key } => Outcome::Reply(vec![self.cmd_get(&key)]),
            Command::Replay { key } => Outcome::Reply(self.cmd_replay(&key)),
            Command::Exit => Outcome::Exit,
        }
    }

    fn cmd_get(&self, key: &str) -> String {
        match self.cache.get(key) {
            Some(value) => format!("Value: {}", String::from_utf8_lossy(&value)),
            None => "Key not found.".to_string(),
        }
    }

    fn cmd_replay(&self, key: &str) -> Vec<String> {
        match self.cache.replay(key) {
            None => vec!["Key not found.".to_string()],
            Some(records) if records.is_empty() => {
                vec![format!("No recent history for key: {key}")]
            }
            Some(records) => format_replay(&records),
        }
    }

    /// Read access to the underlying cache (metrics, shutdown).
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Stops the cache's eviction workers.
    pub async fn shutdown(&mut self) {
        self.cache.shutdown().await;
    }
}

/// Renders replay records as `[YYYY-MM-DD HH:MM:SS] <value>` lines.
///
/// Log timestamps are monotonic; to display them we sample the monotonic
/// and wall clocks together and shift each record by its age.
fn format_replay(records: &[LogRecord]) -> Vec<String> {
    let mono_now = Instant::now();
    let wall_now: DateTime<Local> = Local::now();

    records
        .iter()
        .map(|record| {
            let age = mono_now.saturating_duration_since(record.timestamp);
            let age = chrono::Duration::from_std(age).unwrap_or_else(|_| chrono::Duration::zero());
            let wall = wall_now - age;
            format!(
                "[{}] {}",
                wall.format("%Y-%m-%d %H:%M:%S"),
                String::from_utf8_lossy(&record.value)
            )
        })
        .collect()
}
