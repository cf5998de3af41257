//! Command Line Parser
//!
//! Turns one line of REPL input into a typed [`Command`]. Commands are
//! whitespace-separated tokens; the first token names the command and is
//! matched case-insensitively.
//!
//! The parser owns argument-shape validation (token counts, TTL syntax) so
//! the dispatch layer only ever sees well-formed commands. Malformed input
//! maps to a [`ParseError`] carrying the usage hint to print.

use crate::protocol::builder::build_entry;
use crate::storage::Entry;
use thiserror::Error;

/// Usage hint printed for a malformed SET.
pub const SET_USAGE: &str = "Usage: SET <key> <value> [ttlSeconds]";
/// Usage hint printed for a malformed GET.
pub const GET_USAGE: &str = "Usage: GET <key>";
/// Usage hint printed for a malformed REPLAY.
pub const REPLAY_USAGE: &str = "Usage: REPLAY <key>";

/// Errors produced while parsing a line of input.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The line contained no tokens; the REPL just re-prompts.
    #[error("empty input")]
    Empty,

    /// A known command with malformed arguments; the payload is the usage
    /// hint to show the user.
    #[error("{0}")]
    Usage(&'static str),

    /// The first token is not a command we know.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// A fully validated command, ready to dispatch.
#[derive(Debug)]
pub enum Command {
    /// Store or overwrite a key.
    Set { key: String, entry: Entry },
    /// Look up a key.
    Get { key: String },
    /// Print a key's recent history.
    Replay { key: String },
    /// Stop the workers and leave the REPL.
    Exit,
}

/// Splits a line into whitespace-separated tokens.
pub fn tokenize(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_owned).collect()
}

/// Parses one line of input into a [`Command`].
pub fn parse(input: &str) -> Result<Command, ParseError> {
    let tokens = tokenize(input);
    let Some(cmd) = tokens.first() else {
        return Err(ParseError::Empty);
    };

    match cmd.to_uppercase().as_str() {
        "SET" => match build_entry(&tokens) {
            Some(entry) => Ok(Command::Set {
                key: tokens[1].clone(),
                entry,
            }),
            None => Err(ParseError::Usage(SET_USAGE)),
        },
        "GET" => match tokens.as_slice() {
            [_, key] => Ok(Command::Get { key: key.clone() }),
            _ => Err(ParseError::Usage(GET_USAGE)),
        },
        "REPLAY" => match tokens.as_slice() {
            [_, key] => Ok(Command::Replay { key: key.clone() }),
            _ => Err(ParseError::Usage(REPLAY_USAGE)),
        },
        "EXIT" => Ok(Command::Exit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}
