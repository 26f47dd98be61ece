//! Fixed-capacity, single-writer columnar buffer for the currently-active
//! segment.
//!
//! Capacity equals `max_sealed_buffer_size` and is reserved up front, so the
//! ingest worker can append through a shared `&self` while queries scan the
//! already-committed prefix without ever taking a lock — the same
//! atomic-commit-count technique `ring.rs` uses for its cursors, specialized
//! to a single writer that never wraps: a tick is written into
//! `columns[committed]` and only then is `committed` published with a
//! Release store, so a reader that Acquire-loads `committed` and sees `n` is
//! guaranteed every column write below index `n` happened-before its load.
//!
//! Once the buffer manager swaps a buffer out (because it reached capacity),
//! nothing calls `insert` on it again, so every live `Arc<ActiveBuffer>` —
//! whether held by an in-flight query's snapshot or by the sealing task — is
//! reading an effectively immutable value from that point on.

use crate::buffer::ColumnarBuffer;
use crate::invariants::debug_assert_active_buffer_bounded;
use crate::tick::Tick;
use crate::trade_condition::TradeCondition;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn uninit_boxed_slice<T>(capacity: usize) -> Box<[MaybeUninit<T>]> {
    let mut v = Vec::with_capacity(capacity);
    for _ in 0..capacity {
        v.push(MaybeUninit::uninit());
    }
    v.into_boxed_slice()
}

struct Columns {
    timestamps: Box<[MaybeUninit<u64>]>,
    symbol_ids: Box<[MaybeUninit<u32>]>,
    exchange_ids: Box<[MaybeUninit<u32>]>,
    prices: Box<[MaybeUninit<f64>]>,
    volumes: Box<[MaybeUninit<u32>]>,
    trade_conditions: Box<[MaybeUninit<TradeCondition>]>,
}

impl Columns {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamps: uninit_boxed_slice(capacity),
            symbol_ids: uninit_boxed_slice(capacity),
            exchange_ids: uninit_boxed_slice(capacity),
            prices: uninit_boxed_slice(capacity),
            volumes: uninit_boxed_slice(capacity),
            trade_conditions: uninit_boxed_slice(capacity),
        }
    }
}

pub struct ActiveBuffer {
    capacity: usize,
    committed: AtomicUsize,
    sorted: AtomicBool,
    columns: UnsafeCell<Columns>,
}

// SAFETY: the buffer manager guarantees at most one writer (the ingest
// worker) ever calls `insert` on a given `ActiveBuffer`, and only before it
// has been swapped out. A writer only publishes slot `idx` by storing
// `committed = idx + 1` with Release after fully writing all six columns at
// `idx`; readers only ever read indices below an Acquire-loaded `committed`,
// so they never observe a partially written slot. `timestamps`/etc. are
// never resized after construction, so no reader ever observes a dangling
// pointer from a concurrent reallocation.
unsafe impl Sync for ActiveBuffer {}

impl ActiveBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            committed: AtomicUsize::new(0),
            sorted: AtomicBool::new(true),
            columns: UnsafeCell::new(Columns::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of committed (safely readable) records.
    pub fn len(&self) -> usize {
        self.committed.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted.load(Ordering::Acquire)
    }

    /// Appends `tick`. Single-writer only (the ingest worker). Returns
    /// `false` if the buffer is already at capacity — the buffer manager is
    /// expected to swap in a fresh buffer at the seal threshold before this
    /// can happen, so callers should treat a `false` return as a sign the
    /// swap threshold check is out of sync with capacity.
    pub fn insert(&self, tick: Tick) -> bool {
        let idx = self.committed.load(Ordering::Relaxed);
        if idx >= self.capacity {
            return false;
        }
        debug_assert_active_buffer_bounded!(idx, self.capacity);

        // SAFETY: single writer, and slot `idx` has not yet been published
        // (`committed == idx`), so no reader has observed it and none will
        // until the Release store below.
        unsafe {
            let columns = &mut *self.columns.get();
            if idx > 0 && self.sorted.load(Ordering::Relaxed) {
                let last = columns.timestamps[idx - 1].assume_init();
                if tick.timestamp < last {
                    self.sorted.store(false, Ordering::Release);
                }
            }
            columns.timestamps[idx].write(tick.timestamp);
            columns.symbol_ids[idx].write(tick.symbol_id);
            columns.exchange_ids[idx].write(tick.exchange_id);
            columns.prices[idx].write(tick.price);
            columns.volumes[idx].write(tick.volume);
            columns.trade_conditions[idx].write(tick.trade_condition);
        }
        self.committed.store(idx + 1, Ordering::Release);
        true
    }

    /// Reconstructs the tick at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not below a `committed` count this call itself
    /// observes via an Acquire load. Callers that bound a scan with an
    /// earlier `len()` snapshot are still safe: `committed` only grows.
    pub fn tick_at(&self, idx: usize) -> Tick {
        assert!(
            idx < self.committed.load(Ordering::Acquire),
            "index out of committed range"
        );
        // SAFETY: idx is below an Acquire-observed commit count, so the
        // writes that produced it happened-before this read.
        unsafe {
            let columns = &*self.columns.get();
            Tick {
                timestamp: columns.timestamps[idx].assume_init(),
                symbol_id: columns.symbol_ids[idx].assume_init(),
                exchange_id: columns.exchange_ids[idx].assume_init(),
                price: columns.prices[idx].assume_init(),
                volume: columns.volumes[idx].assume_init(),
                trade_condition: columns.trade_conditions[idx].assume_init(),
            }
        }
    }

    /// Copies the committed prefix into an owned, growable [`ColumnarBuffer`].
    /// Called exactly once per buffer, by the sealing task, after the buffer
    /// manager has already swapped this buffer out — nothing appends to it
    /// again, so this is a read of a value that has become immutable.
    pub fn to_columnar(&self) -> ColumnarBuffer {
        let len = self.len();
        let mut out = ColumnarBuffer::with_capacity(len);
        for idx in 0..len {
            out.insert(self.tick_at(idx));
        }
        out
    }
}
