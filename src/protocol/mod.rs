//! Command Protocol
//!
//! The textual surface of the cache: a whitespace tokenizer, the typed
//! [`Command`] produced from one line of input, and the builder that turns
//! SET tokens into a storage [`Entry`](crate::storage::Entry).
//!
//! ```text
//! "SET foo bar 60"
//!        │
//!        ▼ tokenize
//! ["SET", "foo", "bar", "60"]
//!        │
//!        ▼ parse (+ build_entry)
//! Command::Set { key: "foo", entry: Entry { value: "bar", ttl: 60s } }
//! ```

pub mod builder;
pub mod parser;

pub use builder::build_entry;
pub use parser::{parse, tokenize, Command, ParseError};
pub use parser::{GET_USAGE, REPLAY_USAGE, SET_USAGE};
