//! Column-of-arrays storage for ticks. Range scans touch only the timestamp
//! column, which keeps `lower_bound`/`upper_bound` binary search cache-friendly
//! regardless of record width.

use crate::invariants::debug_assert_columns_aligned;
use crate::tick::Tick;
use crate::trade_condition::TradeCondition;

/// A columnar segment of ticks. Either *active* (mutated by the ingest worker)
/// or *sealed* (immutable once published through a snapshot).
#[derive(Debug, Clone)]
pub struct ColumnarBuffer {
    pub(crate) timestamps: Vec<u64>,
    pub(crate) symbol_ids: Vec<u32>,
    pub(crate) exchange_ids: Vec<u32>,
    pub(crate) prices: Vec<f64>,
    pub(crate) volumes: Vec<u32>,
    pub(crate) trade_conditions: Vec<TradeCondition>,
    sorted: bool,
}

impl ColumnarBuffer {
    /// Builds an empty buffer with `capacity` slots pre-reserved so later
    /// appends never reallocate — readers that have taken `len()` once can
    /// scan indices below it without racing a growing allocation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(capacity),
            symbol_ids: Vec::with_capacity(capacity),
            exchange_ids: Vec::with_capacity(capacity),
            prices: Vec::with_capacity(capacity),
            volumes: Vec::with_capacity(capacity),
            trade_conditions: Vec::with_capacity(capacity),
            sorted: true,
        }
    }

    pub fn insert(&mut self, tick: Tick) {
        if self.sorted {
            if let Some(&last) = self.timestamps.last() {
                if tick.timestamp < last {
                    self.sorted = false;
                }
            }
        }
        self.timestamps.push(tick.timestamp);
        self.symbol_ids.push(tick.symbol_id);
        self.exchange_ids.push(tick.exchange_id);
        self.prices.push(tick.price);
        self.volumes.push(tick.volume);
        self.trade_conditions.push(tick.trade_condition);
        debug_assert_columns_aligned!(self);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// Reconstructs the tick stored at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= len()`.
    pub fn tick_at(&self, idx: usize) -> Tick {
        Tick {
            timestamp: self.timestamps[idx],
            symbol_id: self.symbol_ids[idx],
            exchange_id: self.exchange_ids[idx],
            price: self.prices[idx],
            volume: self.volumes[idx],
            trade_condition: self.trade_conditions[idx],
        }
    }

    /// Reorders all six columns by timestamp via an index permutation. Sets
    /// the sortedness flag to `true` on completion.
    pub fn sort(&mut self) {
        if self.sorted {
            return;
        }
        let n = self.timestamps.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| self.timestamps[i]);

        let timestamps = order.iter().map(|&i| self.timestamps[i]).collect();
        let symbol_ids = order.iter().map(|&i| self.symbol_ids[i]).collect();
        let exchange_ids = order.iter().map(|&i| self.exchange_ids[i]).collect();
        let prices = order.iter().map(|&i| self.prices[i]).collect();
        let volumes = order.iter().map(|&i| self.volumes[i]).collect();
        let trade_conditions = order.iter().map(|&i| self.trade_conditions[i]).collect();

        self.timestamps = timestamps;
        self.symbol_ids = symbol_ids;
        self.exchange_ids = exchange_ids;
        self.prices = prices;
        self.volumes = volumes;
        self.trade_conditions = trade_conditions;
        self.sorted = true;
    }

    /// Index of the first element with `timestamp >= ts`.
    pub fn lower_bound(&self, ts: u64) -> usize {
        self.timestamps.partition_point(|&t| t < ts)
    }

    /// Index of the first element with `timestamp > ts`.
    pub fn upper_bound(&self, ts: u64) -> usize {
        self.timestamps.partition_point(|&t| t <= ts)
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(ts: u64) -> Tick {
        Tick::new(ts, 1, 1, 100.0, 10, TradeCondition::None)
    }

    #[test]
    fn empty_buffer_is_sorted() {
        let buf = ColumnarBuffer::with_capacity(4);
        assert!(buf.is_sorted());
    }

    #[test]
    fn ascending_inserts_stay_sorted() {
        let mut buf = ColumnarBuffer::with_capacity(4);
        buf.insert(tick(1));
        buf.insert(tick(2));
        buf.insert(tick(3));
        assert!(buf.is_sorted());
    }

    #[test]
    fn out_of_order_insert_clears_sorted_flag() {
        let mut buf = ColumnarBuffer::with_capacity(4);
        buf.insert(tick(5));
        buf.insert(tick(1));
        assert!(!buf.is_sorted());
    }

    #[test]
    fn sort_restores_ascending_order_and_flag() {
        let mut buf = ColumnarBuffer::with_capacity(4);
        buf.insert(tick(5));
        buf.insert(tick(1));
        buf.insert(tick(3));
        buf.sort();
        assert!(buf.is_sorted());
        assert_eq!(buf.timestamps(), &[1, 3, 5]);
    }

    #[test]
    fn lower_upper_bound_bracket_range() {
        let mut buf = ColumnarBuffer::with_capacity(8);
        for ts in [10, 20, 30, 40, 50] {
            buf.insert(tick(ts));
        }
        assert_eq!(buf.lower_bound(25), 2);
        assert_eq!(buf.upper_bound(40), 4);
    }

    #[test]
    fn copy_is_independent() {
        let mut buf = ColumnarBuffer::with_capacity(4);
        buf.insert(tick(1));
        let mut copy = buf.copy();
        copy.insert(tick(2));
        assert_eq!(buf.len(), 1);
        assert_eq!(copy.len(), 2);
    }

    proptest::proptest! {
        /// Property 3: after sort(), the buffer is flagged sorted and its
        /// timestamp column is non-decreasing.
        #[test]
        fn sort_yields_nondecreasing_timestamps(values in proptest::collection::vec(0u64..10_000, 0..100)) {
            let mut buf = ColumnarBuffer::with_capacity(values.len().max(1));
            for &v in &values {
                buf.insert(tick(v));
            }
            buf.sort();
            proptest::prop_assert!(buf.is_sorted());
            for w in buf.timestamps().windows(2) {
                proptest::prop_assert!(w[0] <= w[1]);
            }
        }

        /// Property 4: the sortedness flag tracks insertion order exactly.
        #[test]
        fn sortedness_flag_tracks_insertion_order(values in proptest::collection::vec(0u64..10_000, 1..100)) {
            let mut buf = ColumnarBuffer::with_capacity(values.len());
            let mut expected_sorted = true;
            let mut last = None;
            for &v in &values {
                if let Some(prev) = last {
                    if v < prev {
                        expected_sorted = false;
                    }
                }
                last = Some(v);
                buf.insert(tick(v));
                if expected_sorted {
                    proptest::prop_assert!(buf.is_sorted());
                } else {
                    proptest::prop_assert!(!buf.is_sorted());
                }
            }
        }
    }
}
