//! Entry Builder
//!
//! Builds a cache [`Entry`] from SET command tokens
//! (`[cmd, key, value, ttlSeconds?]`).

use crate::storage::Entry;
use bytes::Bytes;
use std::time::{Duration, Instant};

/// Builds an entry from the token form of a SET command.
///
/// Returns None when fewer than three tokens are present or when the
/// optional fourth token is not a non-negative integer. A TTL of zero is
/// valid and yields an entry that is expired on arrival.
///
/// The `time_set` on the returned entry is provisional; the shard stamps
/// its own on insert.
pub fn build_entry(tokens: &[String]) -> Option<Entry> {
    if tokens.len() < 3 {
        return None;
    }

    let mut entry = Entry::new(Bytes::from(tokens[2].clone()));

    if let Some(raw_ttl) = tokens.get(3) {
        let secs: u64 = raw_ttl.parse().ok()?;
        entry.expiration = Some(Instant::now() + Duration::from_secs(secs));
    }

    Some(entry)
}
