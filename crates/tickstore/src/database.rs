//! Public facade: insert, range query, aggregate, size, flush.

use crate::active_buffer::ActiveBuffer;
use crate::aggregate::{self, AggregateResult};
use crate::backoff::Backoff;
use crate::config::DbConfig;
use crate::manager::BufferManager;
use crate::pool::{TaskHandle, WorkerPool};
use crate::ring::Ring;
use crate::snapshot::Snapshot;
use crate::tick::Tick;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// The in-memory tick store. Owns the ring, the worker pool, and the buffer
/// manager; submits a single ingest task to the pool at construction.
pub struct Database {
    ring: Arc<Ring<Tick>>,
    pool: Arc<WorkerPool>,
    manager: Arc<BufferManager>,
    stop: Arc<AtomicBool>,
    wake: Arc<(Mutex<bool>, Condvar)>,
    ingest_task: Mutex<Option<TaskHandle<()>>>,
    config: DbConfig,
}

impl Database {
    pub fn new() -> Self {
        Self::with_config(DbConfig::default())
    }

    pub fn with_config(config: DbConfig) -> Self {
        let ring = Arc::new(Ring::new(config.ring_capacity));
        let pool = Arc::new(WorkerPool::new(config.worker_count()));
        let manager = Arc::new(BufferManager::new(
            Arc::clone(&pool),
            config.max_sealed_buffer_size,
            config.max_sealed,
        ));
        let stop = Arc::new(AtomicBool::new(false));
        let wake = Arc::new((Mutex::new(false), Condvar::new()));

        let ingest_task = submit_ingest_task(
            &pool,
            Arc::clone(&ring),
            Arc::clone(&manager),
            Arc::clone(&stop),
            Arc::clone(&wake),
        )
        .expect("freshly constructed worker pool accepts the ingest task");

        Self {
            ring,
            pool,
            manager,
            stop,
            wake,
            ingest_task: Mutex::new(Some(ingest_task)),
            config,
        }
    }

    /// Pushes `tick` into the ring, retrying with backoff for the lifetime of
    /// this call, then wakes the ingest worker.
    pub fn insert(&self, tick: Tick) {
        self.ring.insert_with_backoff(tick);
        self.notify_ingest_worker();
    }

    pub fn insert_batch(&self, ticks: &[Tick]) {
        for &tick in ticks {
            self.ring.insert_with_backoff(tick);
        }
        self.notify_ingest_worker();
    }

    fn notify_ingest_worker(&self) {
        let (lock, condvar) = &*self.wake;
        let mut ready = lock.lock().unwrap();
        *ready = true;
        condvar.notify_one();
    }

    /// Returns ticks in `[start_ts, end_ts]` sorted ascending by timestamp.
    pub fn get_range(&self, start_ts: u64, end_ts: u64) -> Vec<Tick> {
        self.get_range_filtered(start_ts, end_ts, |_| true)
    }

    pub fn get_range_filtered<F>(&self, start_ts: u64, end_ts: u64, filter: F) -> Vec<Tick>
    where
        F: Fn(&Tick) -> bool,
    {
        if start_ts > end_ts {
            return Vec::new();
        }
        let snapshot = self.manager.state();
        let (sealed_sorted, mut sealed_ticks) =
            collect_from_sealed(&snapshot, start_ts, end_ts, &filter);
        let active_sorted = snapshot.active.is_sorted();
        let active_ticks = collect_from_active(&snapshot.active, start_ts, end_ts, &filter);

        if sealed_sorted && active_sorted {
            merge_sorted(sealed_ticks, active_ticks)
        } else {
            sealed_ticks.extend(active_ticks);
            sealed_ticks.sort_by_key(|t| t.timestamp);
            sealed_ticks
        }
    }

    /// Reduces ticks in `[start_ts, end_ts]` to an [`AggregateResult`].
    pub fn aggregate(&self, start_ts: u64, end_ts: u64) -> AggregateResult {
        self.aggregate_filtered(start_ts, end_ts, |_| true)
    }

    pub fn aggregate_filtered<F>(&self, start_ts: u64, end_ts: u64, filter: F) -> AggregateResult
    where
        F: Fn(&Tick) -> bool,
    {
        let ticks = self.get_range_filtered(start_ts, end_ts, filter);
        aggregate::reduce(ticks.iter())
    }

    /// Approximate total record count: `|sealed| * max_sealed_buffer_size`
    /// (adjusted for the tail segment's actual size) plus the active count.
    pub fn size(&self) -> usize {
        let snapshot = self.manager.state();
        let sealed_len = snapshot.sealed.len();
        let sealed_count = if sealed_len == 0 {
            0
        } else {
            let tail = snapshot.sealed.back().map(|b| b.len()).unwrap_or(0);
            (sealed_len - 1) * self.config.max_sealed_buffer_size + tail
        };
        sealed_count + snapshot.active.len()
    }

    /// Blocks until the ring is drained and all queued sealing tasks
    /// complete, then restarts the pool and resubmits the ingest task so the
    /// database accepts new inserts again.
    pub fn flush(&self) {
        let mut backoff = Backoff::new();
        while !self.ring.is_empty() {
            backoff.snooze();
        }

        self.stop.store(true, Ordering::Release);
        self.notify_ingest_worker();
        if let Some(handle) = self.ingest_task.lock().unwrap().take() {
            let _ = handle.join();
        }

        self.pool.restart();

        self.stop.store(false, Ordering::Release);
        let new_task = submit_ingest_task(
            &self.pool,
            Arc::clone(&self.ring),
            Arc::clone(&self.manager),
            Arc::clone(&self.stop),
            Arc::clone(&self.wake),
        )
        .expect("freshly restarted worker pool accepts the ingest task");
        *self.ingest_task.lock().unwrap() = Some(new_task);
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.notify_ingest_worker();
        if let Some(handle) = self.ingest_task.lock().unwrap().take() {
            let _ = handle.join();
        }
        self.pool.shutdown();
    }
}

/// Submits the ingest loop as a single task on `pool`, occupying one of its
/// `N` workers for as long as the database runs. The worker-count formula in
/// `config.rs` budgets for this: one permanently-busy slot for ingest, the
/// rest free for sealing tasks.
///
/// The loop waits on its own `wake` condition variable, not the pool's
/// internal queue condvar, so stopping it is two steps: set `stop` and
/// notify `wake` (which unblocks the loop itself), *then* call
/// `pool.shutdown()`/`restart()` (which joins the now-returning worker
/// thread). Calling shutdown first would deadlock: the worker never notices
/// the pool wants to stop until it next drains its own wait.
fn submit_ingest_task(
    pool: &WorkerPool,
    ring: Arc<Ring<Tick>>,
    manager: Arc<BufferManager>,
    stop: Arc<AtomicBool>,
    wake: Arc<(Mutex<bool>, Condvar)>,
) -> Result<TaskHandle<()>, crate::error::PoolError> {
    pool.assign_task(move || {
        let (lock, condvar) = &*wake;
        loop {
            {
                let mut ready = lock.lock().unwrap();
                while !*ready && !stop.load(Ordering::Acquire) {
                    ready = condvar.wait(ready).unwrap();
                }
                *ready = false;
            }
            if stop.load(Ordering::Acquire) && ring.is_empty() {
                return;
            }
            let mut backoff = Backoff::new();
            while !ring.is_empty() {
                match ring.read() {
                    Some(tick) => {
                        manager.insert(tick);
                        backoff.reset();
                    }
                    None => backoff.snooze(),
                }
            }
            if stop.load(Ordering::Acquire) {
                return;
            }
        }
    })
}

fn collect_from_sealed<F>(
    snapshot: &Snapshot,
    start_ts: u64,
    end_ts: u64,
    filter: &F,
) -> (bool, Vec<Tick>)
where
    F: Fn(&Tick) -> bool,
{
    let mut sorted = true;
    let mut last_contributed_ts: Option<u64> = None;
    let mut ticks = Vec::new();

    for buffer in snapshot.sealed.iter() {
        let first = buffer.timestamps().first().copied();
        let last = buffer.timestamps().last().copied();
        let (Some(first), Some(last)) = (first, last) else {
            continue;
        };
        if first > end_ts || last < start_ts {
            continue;
        }

        let lo = buffer.lower_bound(start_ts);
        let hi = buffer.upper_bound(end_ts);
        let mut first_contributed = None;
        let mut last_contributed = None;
        for idx in lo..hi {
            let tick = buffer.tick_at(idx);
            if filter(&tick) {
                if first_contributed.is_none() {
                    first_contributed = Some(tick.timestamp);
                }
                last_contributed = Some(tick.timestamp);
                ticks.push(tick);
            }
        }

        if let (Some(prev_last), Some(this_first)) = (last_contributed_ts, first_contributed) {
            if this_first < prev_last {
                sorted = false;
            }
        }
        if let Some(last) = last_contributed {
            last_contributed_ts = Some(last);
        }
    }

    (sorted, ticks)
}

fn collect_from_active<F>(buffer: &ActiveBuffer, start_ts: u64, end_ts: u64, filter: &F) -> Vec<Tick>
where
    F: Fn(&Tick) -> bool,
{
    let count = buffer.len();
    let mut ticks = Vec::new();
    for idx in 0..count {
        let tick = buffer.tick_at(idx);
        if tick.timestamp >= start_ts && tick.timestamp <= end_ts && filter(&tick) {
            ticks.push(tick);
        }
    }
    ticks
}

fn merge_sorted(sealed: Vec<Tick>, active: Vec<Tick>) -> Vec<Tick> {
    let mut out = Vec::with_capacity(sealed.len() + active.len());
    let mut i = 0;
    let mut j = 0;
    while i < sealed.len() && j < active.len() {
        if sealed[i].timestamp <= active[j].timestamp {
            out.push(sealed[i]);
            i += 1;
        } else {
            out.push(active[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&sealed[i..]);
    out.extend_from_slice(&active[j..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade_condition::TradeCondition;
    use std::thread;
    use std::time::Duration;

    fn tick(ts: u64, price: f64, volume: u32, symbol_id: u32) -> Tick {
        Tick::new(ts, symbol_id, 1, price, volume, TradeCondition::None)
    }

    fn test_config(max_sealed_buffer_size: usize, max_sealed: usize) -> DbConfig {
        DbConfig {
            ring_capacity: 1024,
            max_sealed_buffer_size,
            max_sealed,
            min_threads: 2,
        }
    }

    // S1
    #[test]
    fn basic_insert_and_range() {
        let db = Database::with_config(test_config(10_000, 100));
        db.insert(tick(1000, 150.25, 100, 1));
        db.insert(tick(1001, 200.50, 50, 1));
        db.flush();
        let result = db.get_range(1000, 1001);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].timestamp, 1000);
        assert_eq!(result[1].timestamp, 1001);
        assert_eq!(db.size(), 2);
    }

    // S2
    #[test]
    fn filter_restricts_by_symbol() {
        let db = Database::with_config(test_config(10_000, 100));
        db.insert(tick(1000, 150.10, 100, 1));
        db.insert(tick(1002, 200.00, 50, 2));
        db.insert(tick(1005, 150.11, 120, 1));
        db.flush();
        let result = db.get_range_filtered(1000, 2000, |t| t.symbol_id == 1);
        assert_eq!(result.len(), 2);
    }

    // S3
    #[test]
    fn aggregate_matches_expected_reduction() {
        let db = Database::with_config(test_config(10_000, 100));
        db.insert(tick(100, 100.0, 10, 1));
        db.insert(tick(101, 150.0, 20, 1));
        db.insert(tick(102, 120.0, 30, 1));
        db.flush();
        let agg = db.aggregate(100, 102);
        assert_eq!(agg.count(), 3);
        assert_eq!(agg.total_volume(), 60);
        assert_eq!(agg.max_price(), 150.0);
        assert_eq!(agg.min_price(), 100.0);
        let expected_vwap = (100.0 * 10.0 + 150.0 * 20.0 + 120.0 * 30.0) / 60.0;
        assert!((agg.vwap() - expected_vwap).abs() < 1e-9);
    }

    // S4 / S5: merge across two sealed segments and the active buffer
    #[test]
    fn merges_sealed_segments_and_active_buffer() {
        let db = Database::with_config(test_config(5, 100));
        for ts in [100, 110, 120, 130, 140] {
            db.insert(tick(ts, 100.0, 10, 1));
        }
        for ts in [20, 30, 40, 50, 60] {
            db.insert(tick(ts, 100.0, 10, 1));
        }
        db.flush();
        for ts in [125, 15, 80, 200, 95] {
            db.insert(tick(ts, 100.0, 10, 1));
        }
        // give the ingest worker a moment to drain into the active buffer
        for _ in 0..200 {
            if db.manager.active_len() == 5 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        let result = db.get_range(0, 150);
        let timestamps: Vec<u64> = result.iter().map(|t| t.timestamp).collect();
        assert_eq!(
            timestamps,
            vec![15, 20, 30, 40, 50, 60, 80, 95, 100, 110, 120, 125, 130, 140]
        );

        let sub = db.get_range(55, 115);
        let sub_ts: Vec<u64> = sub.iter().map(|t| t.timestamp).collect();
        assert_eq!(sub_ts, vec![60, 80, 95, 100, 110]);
    }

    // S6
    #[test]
    fn zero_volume_tick_does_not_skew_vwap() {
        let db = Database::with_config(test_config(10_000, 100));
        db.insert(tick(103, 110.0, 60, 1));
        db.insert(tick(104, 130.0, 0, 1));
        db.flush();
        let agg = db.aggregate(103, 104);
        assert_eq!(agg.count(), 2);
        assert_eq!(agg.vwap(), 110.0);
    }

    #[test]
    fn invalid_range_returns_empty() {
        let db = Database::with_config(test_config(10_000, 100));
        db.insert(tick(1, 1.0, 1, 1));
        db.flush();
        assert!(db.get_range(10, 5).is_empty());
        assert_eq!(db.aggregate(10, 5).count(), 0);
    }

    #[test]
    fn flush_is_idempotent() {
        let db = Database::with_config(test_config(10_000, 100));
        db.insert(tick(1, 1.0, 1, 1));
        db.flush();
        db.flush();
        assert_eq!(db.get_range(0, 10).len(), 1);
    }
}
