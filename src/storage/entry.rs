//! Cache Entry Types
//!
//! Defines the records a shard stores: the cache entry itself, the per-key
//! history log element, and the expiry event queued in the eviction heap.
//!
//! All timestamps here come from the monotonic clock (`std::time::Instant`).
//! Wall-clock time only appears at the presentation layer when replay output
//! is formatted for display.

use bytes::Bytes;
use std::time::{Duration, Instant};

/// A stored value with optional expiry time.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// When this entry expires (None = never expires)
    pub expiration: Option<Instant>,
    /// When this entry was last written. The shard overwrites this on insert,
    /// so the value a builder puts here is provisional.
    pub time_set: Instant,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expiration: None,
            time_set: Instant::now(),
        }
    }

    /// Creates a new entry that expires `ttl` from now.
    pub fn with_ttl(value: Bytes, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expiration: Some(now + ttl),
            time_set: now,
        }
    }

    /// Checks whether this entry is expired as of `now`.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expiration.map(|exp| exp <= now).unwrap_or(false)
    }

    /// The TTL this entry was stored with (`expiration - time_set`), or None
    /// for entries that never expire.
    ///
    /// Saturates to zero if the entry inherited an expiration that already
    /// lies in the past (a value-only update on an expired-but-unevicted key).
    pub fn original_ttl(&self) -> Option<Duration> {
        self.expiration
            .map(|exp| exp.saturating_duration_since(self.time_set))
    }
}

/// One element of a key's history log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// When the record was written
    pub timestamp: Instant,
    /// The value written at that time
    pub value: Bytes,
}

/// An `(expiration, key)` pair queued in a shard's eviction heap.
///
/// Several events for the same key may coexist in the heap; only the one
/// whose timestamp equals the key's current expiration is authoritative.
/// The derived ordering compares expiration first and breaks ties on the
/// key, so equal-deadline events pop in a consistent order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExpiryEvent {
    /// When the key becomes eligible for eviction
    pub expiration: Instant,
    /// The key the event refers to
    pub key: String,
}
