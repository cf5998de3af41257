//! Event-Driven Eviction Worker
//!
//! One background task per shard. The worker sleeps until the earliest
//! scheduled expiry in its shard, evicts everything that is due, then trims
//! history logs past the retention horizon. It never polls: between
//! deadlines it is parked on a notifier, and a SET that becomes the new
//! earliest deadline wakes it so it can re-arm its timer.
//!
//! ## Wakeup correctness
//!
//! The shard's wakeup callback is `Notify::notify_one`, which stores a
//! permit when the worker is not currently waiting. A notification that
//! lands between the worker's heap peek and its `notified().await` is
//! therefore never lost. Spurious wakeups are fine by construction: every
//! loop iteration re-reads the heap top before deciding what to do.
//!
//! ## Shutdown
//!
//! `stop()` flips the shutdown watch channel and awaits the task; it is
//! idempotent and safe to call from anywhere. Dropping an un-stopped worker
//! still signals shutdown so the task exits promptly, it just cannot join
//! from a destructor. Wakeup callbacks arriving after shutdown land on the
//! dead task's notifier and are no-ops.

use crate::storage::shard::Shard;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// How long appended history records are retained, independent of any
/// individual key's TTL.
pub const LOG_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Handle to one shard's background eviction task.
#[derive(Debug)]
pub struct EvictionWorker {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl EvictionWorker {
    /// Launches the eviction task for `shard` and wires the shard's wakeup
    /// callback to it. One-shot per shard: installing a second worker on
    /// the same shard panics.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(shard: Arc<Shard>) -> Self {
        let notify = Arc::new(Notify::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let waker = Arc::clone(&notify);
        shard.set_notify_wakeup(move || waker.notify_one());

        let handle = tokio::spawn(run_loop(shard, notify, shutdown_rx));
        trace!("eviction worker started");

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Signals the task to exit and waits for it. Idempotent: a second call
    /// finds nothing to join and returns immediately.
    pub async fn stop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
            trace!("eviction worker stopped");
        }
    }
}

impl Drop for EvictionWorker {
    fn drop(&mut self) {
        // Joining is not possible here; signalling is enough for the task
        // to exit on its next wakeup.
        let _ = self.shutdown_tx.send(true);
    }
}

/// The worker loop: peek, sleep until the deadline (or a wakeup), evict,
/// prune, repeat.
async fn run_loop(shard: Arc<Shard>, notify: Arc<Notify>, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow() {
            return;
        }

        match shard.peek_next_expiry() {
            None => {
                // Nothing scheduled: park until a SET schedules an expiry
                // or shutdown is requested.
                tokio::select! {
                    _ = notify.notified() => {}
                    _ = shutdown_rx.changed() => {}
                }
                // A deadline may have appeared while parked; re-read the
                // heap top instead of evicting on whatever woke us.
                continue;
            }
            Some(deadline) if Instant::now() < deadline => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline.into()) => {}
                    // An earlier expiry arrived: recompute the deadline.
                    _ = notify.notified() => continue,
                    _ = shutdown_rx.changed() => continue,
                }
            }
            // Already due: evict without sleeping.
            Some(_) => {}
        }

        if *shutdown_rx.borrow() {
            return;
        }

        let now = Instant::now();
        let evicted = shard.evict_expired(now);
        if evicted > 0 {
            debug!(evicted, "evicted expired entries");
        }

        // No record can predate the process epoch, so skip pruning until
        // the retention horizon is representable.
        if let Some(cutoff) = now.checked_sub(LOG_RETENTION) {
            shard.prune_all_logs(cutoff);
        }
    }
}
