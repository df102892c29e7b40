//! Storage Layer
//!
//! In-memory repository with retention caps: the watcher writes machine
//! snapshots and event logs into it every poll, and the alert path
//! appends every fired alert. The hosted telemetry store stays the
//! source of truth; this is the server's working set.

mod repository;

pub use repository::{AlertRecord, Repository, RepositoryConfig};

use thiserror::Error;

/// Repository errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("lock error: {0}")]
    Lock(String),
    #[error("record not found")]
    NotFound,
}
