//! Command Dispatch
//!
//! Sits between the protocol layer and the storage core: takes one parsed
//! [`Command`](crate::protocol::Command), runs it against the
//! [`Cache`](crate::storage::Cache), and produces the reply lines the REPL
//! prints.
//!
//! ```text
//! line ──> protocol::parse ──> CommandHandler::execute ──> Outcome
//!                                        │
//!                                        ▼
//!                                  storage::Cache
//! ```

pub mod handler;

pub use handler::{CommandHandler, Outcome};
