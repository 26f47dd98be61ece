//! Tunable constants for the store, bundled behind a `Default` impl the same way
//! `ringmpsc_rs::Config` bundles ring sizing.

/// Default ring capacity (not a power of two — see `ring.rs`).
pub const RING_SIZE: usize = 64_000;
/// Default maximum record count of a sealed segment.
pub const MAX_SEALED_BUFFER_SIZE: usize = 10_000;
/// Default maximum number of sealed segments retained.
pub const MAX_SEALED: usize = 100;
/// Default minimum worker-pool thread count.
pub const MIN_THREADS: usize = 3;

/// Configuration bundle for [`crate::Database`].
///
/// `Database::new()` uses `DbConfig::default()`. `Database::with_config` is the
/// extension point for callers who need non-default thresholds, e.g. tests that
/// want to exercise sealing/eviction without inserting tens of thousands of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbConfig {
    pub ring_capacity: usize,
    pub max_sealed_buffer_size: usize,
    pub max_sealed: usize,
    pub min_threads: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            ring_capacity: RING_SIZE,
            max_sealed_buffer_size: MAX_SEALED_BUFFER_SIZE,
            max_sealed: MAX_SEALED,
            min_threads: MIN_THREADS,
        }
    }
}

impl DbConfig {
    /// Worker count derived from available parallelism, floored at `min_threads`.
    pub fn worker_count(&self) -> usize {
        let hw = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        (hw / 2).max(self.min_threads)
    }
}
