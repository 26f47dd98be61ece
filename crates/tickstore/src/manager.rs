//! Owns the active buffer and the sealed chain, publishes snapshots, and
//! schedules sealing work on the worker pool.

use crate::active_buffer::ActiveBuffer;
use crate::backoff::Backoff;
use crate::invariants::debug_assert_chain_bounded;
use crate::pool::WorkerPool;
use crate::snapshot::Snapshot;
use crate::tick::Tick;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Active buffer + sealed chain, published together as a [`Snapshot`].
///
/// `insert` is called only by the ingest worker, and it appends straight into
/// the active buffer's own lock-free commit-count protocol — the mutex here
/// only ever guards swapping *which* `Arc<ActiveBuffer>` is current, an O(1)
/// pointer operation, never the buffer's column data itself. `state()` takes
/// the same mutex just long enough to clone two `Arc`s, so a query never
/// blocks on, or blocks, an in-flight insert.
///
/// Sealing runs on the worker pool, so with more than one worker two sealing
/// tasks can be in flight at once and finish sorting in either order. A
/// ticket counter fixes the chain append order to swap order regardless of
/// which task's sort finishes first: each task is handed the ticket it was
/// issued at swap time and spins until it is next in line before appending.
pub struct BufferManager {
    snapshot: Arc<Mutex<Snapshot>>,
    pool: Arc<WorkerPool>,
    max_sealed_buffer_size: usize,
    max_sealed: usize,
    next_seal_ticket: AtomicU64,
    next_seal_to_append: Arc<AtomicU64>,
}

impl BufferManager {
    pub fn new(pool: Arc<WorkerPool>, max_sealed_buffer_size: usize, max_sealed: usize) -> Self {
        let snapshot = Snapshot {
            active: Arc::new(ActiveBuffer::with_capacity(max_sealed_buffer_size)),
            sealed: Arc::new(VecDeque::new()),
        };
        Self {
            snapshot: Arc::new(Mutex::new(snapshot)),
            pool,
            max_sealed_buffer_size,
            max_sealed,
            next_seal_ticket: AtomicU64::new(0),
            next_seal_to_append: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Appends `tick` to the active buffer; called only by the ingest worker.
    /// When the active buffer reaches the seal threshold, swaps in a fresh
    /// buffer and schedules a sealing task for the old one.
    pub fn insert(&self, tick: Tick) {
        let active = Arc::clone(&self.snapshot.lock().unwrap().active);
        active.insert(tick);
        if active.len() >= self.max_sealed_buffer_size {
            let fresh = Arc::new(ActiveBuffer::with_capacity(self.max_sealed_buffer_size));
            self.snapshot.lock().unwrap().active = fresh;
            // Issued here, on the single-writer ingest path, so ticket order
            // is exactly swap order.
            let ticket = self.next_seal_ticket.fetch_add(1, Ordering::Relaxed);
            self.schedule_seal(active, ticket);
        }
    }

    fn schedule_seal(&self, to_seal: Arc<ActiveBuffer>, ticket: u64) {
        let snapshot = Arc::clone(&self.snapshot);
        let max_sealed = self.max_sealed;
        let next_to_append = Arc::clone(&self.next_seal_to_append);

        let _ = self.pool.assign_task(move || {
            let mut buffer = to_seal.to_columnar();
            if !buffer.is_sorted() {
                buffer.sort();
            }
            let buffer = Arc::new(buffer);

            let mut backoff = Backoff::new();
            while next_to_append.load(Ordering::Acquire) != ticket {
                backoff.snooze();
            }

            let mut guard = snapshot.lock().unwrap();
            let mut chain = (*guard.sealed).clone();
            chain.push_back(buffer);
            if chain.len() > max_sealed {
                chain.pop_front();
            }
            debug_assert_chain_bounded!(chain, max_sealed);
            guard.sealed = Arc::new(chain);
            drop(guard);

            next_to_append.store(ticket + 1, Ordering::Release);
        });
    }

    /// A consistent view of (active buffer, sealed chain) at this instant.
    pub fn state(&self) -> Snapshot {
        self.snapshot.lock().unwrap().clone()
    }

    /// Count of ticks currently in the active buffer. Advisory.
    pub fn active_len(&self) -> usize {
        self.snapshot.lock().unwrap().active.len()
    }
}
