//! Shard: a Self-Contained Mini-Cache
//!
//! Each shard owns a slice of the key space with its own index, eviction
//! heap, per-key history logs, and reader-writer lock. A shard never talks
//! to other shards; the router decides which shard owns a key.
//!
//! ## Design Decisions
//!
//! 1. **One lock, three collections**: the index, the eviction heap, and the
//!    history logs move together on every write, so a single `RwLock` guards
//!    all three. Readers (GET, REPLAY, peek) share the lock.
//! 2. **Append-only heap**: updating a key's TTL pushes a fresh event and
//!    leaves the old one behind. The eviction path validates each popped
//!    event against the index and silently discards mismatches. This is
//!    cheaper than decrease-key and keeps SET simple.
//! 3. **Notify outside the lock**: SET releases the write lock before waking
//!    the eviction worker, so a wakeup can never block on the lock the
//!    notifier just held.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                    Shard                      │
//! │  ┌─────────────────────────────────────────┐  │
//! │  │ RwLock<ShardState>                      │  │
//! │  │   index: HashMap<String, Entry>         │  │
//! │  │   heap:  BinaryHeap<Reverse<Event>>     │  │
//! │  │   logs:  HashMap<String, VecDeque<..>>  │  │
//! │  └─────────────────────────────────────────┘  │
//! │  notify_wakeup: OnceLock<callback>            │
//! │  metrics: relaxed atomics                     │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Lock poisoning means a writer panicked mid-update; the shard treats that
//! as a fatal programming error and propagates the panic.

use crate::storage::entry::{Entry, ExpiryEvent, LogRecord};
use bytes::Bytes;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Soft deadline for a single `prune_all_logs` sweep. Pruning is best-effort;
/// an interrupted sweep resumes on the next worker cycle.
pub const MAX_PRUNE_TIME: Duration = Duration::from_millis(5);

type WakeupFn = Box<dyn Fn() + Send + Sync>;

/// Counters exposed by a shard. All increments use relaxed ordering; the
/// numbers are monitoring data, not synchronization.
#[derive(Debug, Default)]
pub struct ShardMetrics {
    /// Total entries removed by the eviction worker
    pub evictions_total: AtomicU64,
    /// Number of eviction passes that removed at least one entry
    pub eviction_batches: AtomicU64,
    /// Current eviction heap length (stale events included)
    pub heap_size: AtomicU64,
    /// Times a SET observed its expiry at the top of the heap and woke the worker
    pub notify_earlier_expiry_count: AtomicU64,
}

/// Everything the shard lock guards.
#[derive(Debug, Default)]
struct ShardState {
    index: HashMap<String, Entry>,
    heap: BinaryHeap<Reverse<ExpiryEvent>>,
    logs: HashMap<String, VecDeque<LogRecord>>,
}

/// A partition of the key space with its own storage and synchronization.
pub struct Shard {
    state: RwLock<ShardState>,
    /// Installed once by the eviction worker at start, read lock-free after.
    notify_wakeup: OnceLock<WakeupFn>,
    metrics: ShardMetrics,
}

impl std::fmt::Debug for Shard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shard")
            .field("len", &self.len())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl Default for Shard {
    fn default() -> Self {
        Self::new()
    }
}

impl Shard {
    /// Creates an empty shard with no wakeup callback installed.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ShardState::default()),
            notify_wakeup: OnceLock::new(),
            metrics: ShardMetrics::default(),
        }
    }

    /// Registers the callback used to wake this shard's eviction worker.
    ///
    /// Called exactly once, by the worker, before it starts sleeping.
    /// Publication happens through the `OnceLock`, so subsequent readers
    /// need no lock.
    pub(crate) fn set_notify_wakeup(&self, cb: impl Fn() + Send + Sync + 'static) {
        if self.notify_wakeup.set(Box::new(cb)).is_err() {
            panic!("eviction wakeup callback installed twice");
        }
    }

    /// Adds or updates an entry.
    ///
    /// A value-only update (no expiration on the incoming entry) inherits
    /// the existing expiration instead of resetting the TTL. If the stored
    /// entry expires, an expiry event is pushed and the eviction worker is
    /// notified after the lock is released.
    pub fn set(&self, key: String, mut entry: Entry) {
        let now = Instant::now();

        // Decide after unlocking whether to notify the eviction worker.
        let mut notify_at = None;
        let heap_len;

        {
            let mut state = self.state.write().unwrap();

            if entry.expiration.is_none() {
                if let Some(existing) = state.index.get(&key) {
                    entry.expiration = existing.expiration;
                }
            }

            entry.time_set = now;

            if let Some(t) = entry.expiration {
                state.heap.push(Reverse(ExpiryEvent {
                    expiration: t,
                    key: key.clone(),
                }));
                notify_at = Some(t);
            }

            state.logs.entry(key.clone()).or_default().push_back(LogRecord {
                timestamp: now,
                value: entry.value.clone(),
            });

            state.index.insert(key, entry);
            heap_len = state.heap.len();
        }

        if let Some(t) = notify_at {
            self.notify_new_expiry(t);
        }

        self.metrics.heap_size.store(heap_len as u64, Ordering::Relaxed);
    }

    /// Retrieves a value, or None if the key is absent or expired.
    ///
    /// An expired-but-unevicted entry is simply not served; removing it is
    /// the eviction worker's job, so GET stays a pure reader.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let state = self.state.read().unwrap();
        let entry = state.index.get(key)?;
        if entry.is_expired_at(Instant::now()) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Returns the key's history records inside its replay window, oldest
    /// first, or None if the key is not in the index.
    ///
    /// The window is `[now - original_ttl, now]`: fixed in duration to the
    /// TTL the entry was stored with, anchored at the time of the call. A
    /// key stored with a 10-second TTL always replays the last 10 seconds
    /// of writes, even when its own deadline is close. Keys without an
    /// expiration replay their entire retained log.
    pub fn replay(&self, key: &str) -> Option<Vec<LogRecord>> {
        let state = self.state.read().unwrap();
        let entry = state.index.get(key)?;

        // A cutoff earlier than the process epoch is unrepresentable with
        // the monotonic clock; checked_sub maps it to "keep everything".
        let cutoff = entry
            .original_ttl()
            .and_then(|ttl| Instant::now().checked_sub(ttl));

        let records = state
            .logs
            .get(key)
            .map(|log| match cutoff {
                Some(c) => log.iter().filter(|r| r.timestamp >= c).cloned().collect(),
                None => log.iter().cloned().collect(),
            })
            .unwrap_or_default();

        Some(records)
    }

    /// The earliest scheduled expiry, or None if nothing is scheduled.
    ///
    /// The returned timestamp may belong to a stale event; the eviction
    /// path sorts that out at pop time.
    pub fn peek_next_expiry(&self) -> Option<Instant> {
        let state = self.state.read().unwrap();
        state.heap.peek().map(|Reverse(ev)| ev.expiration)
    }

    /// Removes every key whose authoritative expiry is `<= now`.
    ///
    /// Pops the heap while the top is due. A popped event only evicts when
    /// its timestamp still matches the index entry's expiration; anything
    /// else is a stale leftover from a TTL update and is dropped. Log
    /// deques for evicted keys are deleted in a second, brief critical
    /// section so the main one never pays for large per-key deallocations.
    ///
    /// Returns the number of entries evicted.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let mut evicted = Vec::new();
        let heap_len;

        {
            let mut state = self.state.write().unwrap();

            while state
                .heap
                .peek()
                .is_some_and(|Reverse(ev)| ev.expiration <= now)
            {
                let Some(Reverse(event)) = state.heap.pop() else {
                    break;
                };

                let authoritative = state
                    .index
                    .get(&event.key)
                    .is_some_and(|e| e.expiration == Some(event.expiration));

                if authoritative {
                    state.index.remove(&event.key);
                    evicted.push(event.key);
                }
                // Otherwise: stale event, discard silently.
            }

            heap_len = state.heap.len();
        }

        if !evicted.is_empty() {
            let mut state = self.state.write().unwrap();
            for key in &evicted {
                state.logs.remove(key);
            }
        }

        let n = evicted.len();
        self.metrics
            .evictions_total
            .fetch_add(n as u64, Ordering::Relaxed);
        if n > 0 {
            self.metrics.eviction_batches.fetch_add(1, Ordering::Relaxed);
        }
        self.metrics.heap_size.store(heap_len as u64, Ordering::Relaxed);

        n
    }

    /// Drops log records older than `cutoff` from every key's log.
    ///
    /// The sweep aborts once it has held the write lock for
    /// [`MAX_PRUNE_TIME`] and resumes from scratch on the next worker
    /// cycle. Correctness does not depend on finishing in one call.
    pub fn prune_all_logs(&self, cutoff: Instant) {
        let start = Instant::now();
        let mut state = self.state.write().unwrap();

        for log in state.logs.values_mut() {
            while log.front().is_some_and(|r| r.timestamp < cutoff) {
                log.pop_front();
            }

            if start.elapsed() > MAX_PRUNE_TIME {
                break;
            }
        }
    }

    /// Compares `t` against the current top of the heap and wakes the
    /// eviction worker when `t` is the new earliest deadline.
    ///
    /// By the time this runs, `t` is already in the heap, so the top is
    /// never later than `t`; "earlier" therefore means `t` sits at the top.
    /// Any strictly later expiry is already covered by the worker's current
    /// deadline. The wakeup callback only signals a notifier and returns;
    /// it never blocks on the worker. Callers must not hold the shard lock.
    fn notify_new_expiry(&self, t: Instant) {
        let earlier = {
            let state = self.state.read().unwrap();
            match state.heap.peek() {
                None => true,
                Some(Reverse(top)) => t <= top.expiration,
            }
        };

        if earlier {
            self.metrics
                .notify_earlier_expiry_count
                .fetch_add(1, Ordering::Relaxed);
            if let Some(wake) = self.notify_wakeup.get() {
                wake();
            }
        }
    }

    /// Number of keys currently in the index (expired-but-unevicted included).
    pub fn len(&self) -> usize {
        self.state.read().unwrap().index.len()
    }

    /// True if the shard holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The shard's monitoring counters.
    pub fn metrics(&self) -> &ShardMetrics {
        &self.metrics
    }
}
