//! # streamcache - A Sharded In-Memory TTL Cache with Replay
//!
//! streamcache is an interactive in-memory key-value cache. Every entry can
//! carry a time-to-live, every key keeps a bounded history of its recent
//! writes, and REPLAY plays that history back within the key's original TTL
//! window.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         streamcache                           │
//! │                                                               │
//! │  ┌──────────┐    ┌────────────┐    ┌─────────────────┐        │
//! │  │   REPL   │───>│  protocol  │───>│ CommandHandler  │        │
//! │  │ (stdin)  │    │  (parse)   │    │   (dispatch)    │        │
//! │  └──────────┘    └────────────┘    └────────┬────────┘        │
//! │                                             │                 │
//! │                                             ▼                 │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │                      Cache (router)                     │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐        │  │
//! │  │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ ...N    │        │  │
//! │  │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │        │  │
//! │  │  └────▲────┘ └────▲────┘ └────▲────┘ └────▲────┘        │  │
//! │  │       │           │           │           │             │  │
//! │  │   eviction    eviction    eviction    eviction          │  │
//! │  │   worker 0    worker 1    worker 2    worker N          │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Highlights
//!
//! ### Event-driven eviction
//!
//! Each shard keeps a min-heap of scheduled expirations. Its worker sleeps
//! until the earliest one and is woken early when a SET schedules a sooner
//! deadline; it never polls. TTL updates leave stale events in the heap,
//! which the worker validates and discards at pop time.
//!
//! ### Replay windows
//!
//! REPLAY returns the writes that happened within the key's *original* TTL
//! window, anchored at the moment of the call: a key stored with a
//! 10-second TTL always replays the last 10 seconds of writes. Logs are
//! additionally trimmed to a one-hour retention horizon by the workers.
//!
//! ### Sharding plus reader-writer locks
//!
//! Sharding cuts cross-key contention; within a shard a `RwLock` lets GET,
//! REPLAY, and the worker's deadline peek proceed concurrently. All
//! timestamps in the core are monotonic; wall-clock time exists only in
//! replay formatting.
//!
//! ## Module Overview
//!
//! - [`protocol`]: line tokenizer, typed commands, entry builder
//! - [`commands`]: command dispatch and response formatting
//! - [`repl`]: the interactive stdin loop
//! - [`storage`]: shards, eviction workers, and the router

pub mod commands;
pub mod protocol;
pub mod repl;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandHandler, Outcome};
pub use protocol::{Command, ParseError};
pub use storage::{Cache, CacheMetrics, Entry, LogRecord, NUM_SHARDS};

/// Version of streamcache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
