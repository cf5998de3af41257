//! Cache Router
//!
//! The `Cache` distributes keys across a fixed set of shards and forwards
//! every operation to the shard that owns the key. Shard assignment is a
//! pure function of the key, so a key always lands on the same shard for
//! the lifetime of the process. The router holds no state of its own; all
//! mutation is shard-local.

use crate::storage::entry::{Entry, LogRecord};
use crate::storage::eviction::EvictionWorker;
use crate::storage::shard::Shard;
use bytes::Bytes;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Number of shards the cache is partitioned into. More shards mean less
/// lock contention at the cost of one background task each.
pub const NUM_SHARDS: usize = 8;

/// Stable key-to-shard assignment.
#[inline]
pub(crate) fn shard_index(key: &str, num_shards: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % num_shards
}

/// Aggregated counters across all shards.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheMetrics {
    /// Entries removed by eviction workers
    pub evictions_total: u64,
    /// Eviction passes that removed at least one entry
    pub eviction_batches: u64,
    /// Scheduled expiry events currently held, stale ones included
    pub heap_size: u64,
    /// Times a SET became the new earliest deadline and woke a worker
    pub notify_earlier_expiry_count: u64,
}

/// The top-level cache: a fixed array of shards, each with its own
/// eviction worker.
#[derive(Debug)]
pub struct Cache {
    shards: Vec<Arc<Shard>>,
    workers: Vec<EvictionWorker>,
}

impl Cache {
    /// Creates a cache partitioned into `num_shards` shards and launches
    /// one eviction worker per shard.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `num_shards` is zero.
    pub fn new(num_shards: usize) -> Self {
        assert!(num_shards > 0, "cache needs at least one shard");

        let shards: Vec<Arc<Shard>> = (0..num_shards).map(|_| Arc::new(Shard::new())).collect();
        let workers = shards
            .iter()
            .map(|shard| EvictionWorker::start(Arc::clone(shard)))
            .collect();

        Self { shards, workers }
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard {
        &self.shards[shard_index(key, self.shards.len())]
    }

    /// Stores or overwrites an entry under `key`.
    pub fn set(&self, key: String, entry: Entry) {
        self.shard(&key).set(key, entry);
    }

    /// Retrieves the unexpired value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.shard(key).get(key)
    }

    /// Returns the key's history inside its replay window, or None if the
    /// key is unknown.
    pub fn replay(&self, key: &str) -> Option<Vec<LogRecord>> {
        self.shard(key).replay(key)
    }

    /// Trims history logs older than `cutoff` on every shard, serially.
    pub fn prune_all_logs(&self, cutoff: Instant) {
        for shard in &self.shards {
            shard.prune_all_logs(cutoff);
        }
    }

    /// Total number of keys across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.len()).sum()
    }

    /// True if no shard holds any key.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of shards the key space is partitioned into.
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Snapshot of the counters summed across shards.
    pub fn metrics(&self) -> CacheMetrics {
        let mut total = CacheMetrics::default();
        for shard in &self.shards {
            let m = shard.metrics();
            total.evictions_total += m.evictions_total.load(Ordering::Relaxed);
            total.eviction_batches += m.eviction_batches.load(Ordering::Relaxed);
            total.heap_size += m.heap_size.load(Ordering::Relaxed);
            total.notify_earlier_expiry_count +=
                m.notify_earlier_expiry_count.load(Ordering::Relaxed);
        }
        total
    }

    /// Stops every eviction worker and waits for them. Idempotent; must be
    /// called before the process exits so no task outlives the cache.
    pub async fn shutdown(&mut self) {
        for worker in &mut self.workers {
            worker.stop().await;
        }
        info!("all eviction workers stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(value: &str) -> Entry {
        Entry::new(Bytes::from(value.to_string()))
    }

    fn entry_ttl(value: &str, ttl: Duration) -> Entry {
        Entry::with_ttl(Bytes::from(value.to_string()), ttl)
    }

    #[test]
    fn test_shard_index_is_stable() {
        for key in ["foo", "bar", "a-much-longer-key-name", ""] {
            let first = shard_index(key, NUM_SHARDS);
            for _ in 0..10 {
                assert_eq!(shard_index(key, NUM_SHARDS), first);
            }
            assert!(first < NUM_SHARDS);
        }
    }

    #[tokio::test]
    async fn test_set_and_get_route_to_same_shard() {
        let mut cache = Cache::new(NUM_SHARDS);

        for i in 0..100 {
            cache.set(format!("key-{i}"), entry(&format!("value-{i}")));
        }
        for i in 0..100 {
            assert_eq!(
                cache.get(&format!("key-{i}")),
                Some(Bytes::from(format!("value-{i}")))
            );
        }
        assert_eq!(cache.len(), 100);

        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_single_shard_cache() {
        let mut cache = Cache::new(1);
        cache.set("a".to_string(), entry("1"));
        cache.set("b".to_string(), entry("2"));
        assert_eq!(cache.get("a"), Some(Bytes::from("1")));
        assert_eq!(cache.get("b"), Some(Bytes::from("2")));
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_replay_routes_to_owning_shard() {
        let mut cache = Cache::new(NUM_SHARDS);
        cache.set("key".to_string(), entry("a"));
        cache.set("key".to_string(), entry("b"));

        let records = cache.replay("key").unwrap();
        assert_eq!(records.len(), 2);
        assert!(cache.replay("missing").is_none());

        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_prune_fans_out_to_all_shards() {
        let mut cache = Cache::new(4);
        for i in 0..40 {
            cache.set(format!("key-{i}"), entry("old"));
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        let cutoff = Instant::now();
        for i in 0..40 {
            cache.set(format!("key-{i}"), entry("new"));
        }

        cache.prune_all_logs(cutoff);

        for i in 0..40 {
            let records = cache.replay(&format!("key-{i}")).unwrap();
            assert_eq!(records.len(), 1, "old record should be pruned everywhere");
            assert_eq!(records[0].value, Bytes::from("new"));
        }

        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_workers_evict_across_shards() {
        let mut cache = Cache::new(4);
        for i in 0..20 {
            cache.set(format!("key-{i}"), entry_ttl("v", Duration::from_millis(40)));
        }

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(cache.is_empty());
        let metrics = cache.metrics();
        assert_eq!(metrics.evictions_total, 20);
        assert!(metrics.eviction_batches >= 1);
        assert_eq!(metrics.heap_size, 0);

        cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_bounded() {
        let mut cache = Cache::new(NUM_SHARDS);
        cache.set("key".to_string(), entry_ttl("v", Duration::from_secs(3600)));

        let begin = Instant::now();
        cache.shutdown().await;
        cache.shutdown().await;
        assert!(begin.elapsed() < Duration::from_secs(1));
    }

    #[test]
    #[should_panic(expected = "at least one shard")]
    fn test_zero_shards_rejected() {
        // No runtime needed: the assert fires before any worker spawns.
        let _ = Cache::new(0);
    }
}
