//! Internal error types. The public [`crate::Database`] facade stays infallible;
//! these are consumed by the buffer manager and ingest worker, which log via
//! `eprintln!` and continue.

use thiserror::Error;

/// Errors surfaced by the worker pool's task-submission and panic-capture paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("worker pool is shutting down")]
    ShuttingDown,
    #[error("task panicked: {0}")]
    Panicked(String),
}
