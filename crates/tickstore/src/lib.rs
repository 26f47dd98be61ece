//! An in-memory time-series store for tick-shaped trade records.
//!
//! Producers push ticks into a bounded ring; a single ingest task, itself
//! running on the worker pool, drains it into a columnar active buffer; once
//! the buffer reaches a size threshold it is sealed (sorted, appended to a
//! bounded chain) by another task on that same pool. Range and aggregate
//! queries read a snapshot of (active buffer, sealed chain), and both halves
//! are handed out as shared `Arc` handles with no copy: the active buffer
//! publishes each append through an atomically-published commit count, so a
//! query scans the already-committed prefix while the ingest task keeps
//! appending beyond it, neither one blocking the other.
//!
//! # Example
//!
//! ```
//! use tickstore::{Database, Tick, TradeCondition};
//!
//! let db = Database::new();
//! db.insert(Tick::new(1_700_000_000, 1, 1, 101.5, 10, TradeCondition::RegularSale));
//! db.flush();
//! let ticks = db.get_range(0, u64::MAX);
//! assert_eq!(ticks.len(), 1);
//! ```

mod active_buffer;
mod aggregate;
mod backoff;
mod buffer;
mod config;
mod database;
mod error;
mod invariants;
mod manager;
mod pool;
mod ring;
mod snapshot;
mod tick;
mod trade_condition;

pub use aggregate::AggregateResult;
pub use config::{DbConfig, MAX_SEALED, MAX_SEALED_BUFFER_SIZE, MIN_THREADS, RING_SIZE};
pub use database::Database;
pub use error::PoolError;
pub use tick::{Tick, SERIALIZED_SIZE};
pub use trade_condition::TradeCondition;
