//! A consistent view over (active buffer, sealed chain) returned to queries.

use crate::active_buffer::ActiveBuffer;
use crate::buffer::ColumnarBuffer;
use std::collections::VecDeque;
use std::sync::Arc;

/// Immutable pair (active-buffer handle, sealed-chain handle) representing a
/// query's view of the store. Cloning a `Snapshot` is two `Arc` clones, never
/// a copy of the underlying columns: `active` is the same live handle the
/// ingest worker keeps appending to through its own lock-free commit-count
/// protocol, and `sealed` is shared and immutable once reachable here.
#[derive(Clone)]
pub struct Snapshot {
    pub active: Arc<ActiveBuffer>,
    pub sealed: Arc<VecDeque<Arc<ColumnarBuffer>>>,
}
