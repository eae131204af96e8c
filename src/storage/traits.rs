//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::activitypub::Representation;
use crate::storage::{RunRecord, RunStatus, StatusRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Status not found: {0}")]
    StatusNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The crawl core only needs `get_status` and `touch_fetched_replies_at`; the
/// rest serves follow-up jobs, run tracking and statistics.
pub trait Storage {
    // ===== Statuses =====

    /// Inserts a status by URI or returns the existing ID
    fn insert_or_get_status(&mut self, uri: &str) -> StorageResult<i64>;

    /// Gets a status by ID
    ///
    /// Fails with `StatusNotFound` if there is no such row.
    fn get_status(&self, id: i64) -> StorageResult<StatusRecord>;

    /// Gets a status by URI
    fn get_status_by_uri(&self, uri: &str) -> StorageResult<Option<StatusRecord>>;

    /// Stores a fetched representation, creating the status if needed
    ///
    /// Idempotent: storing the same URI again overwrites the previous
    /// snapshot and returns the same ID.
    fn store_representation(
        &mut self,
        uri: &str,
        representation: &Representation,
    ) -> StorageResult<i64>;

    /// Stamps the current time on the status's `fetched_replies_at` field
    fn touch_fetched_replies_at(&mut self, id: i64) -> StorageResult<DateTime<Utc>>;

    // ===== Run Tracking =====

    /// Records the start of a crawl job for a root
    fn create_run(&mut self, root_id: i64) -> StorageResult<i64>;

    /// Records the outcome of a crawl job
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        attempts: u32,
        visited_count: Option<u64>,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Statistics =====

    /// Total number of known statuses
    fn count_statuses(&self) -> StorageResult<u64>;

    /// Number of statuses with a stored representation
    fn count_fetched_statuses(&self) -> StorageResult<u64>;

    /// Number of statuses whose replies have been crawled at least once
    fn count_crawled_roots(&self) -> StorageResult<u64>;

    /// Number of runs in a given status
    fn count_runs_by_status(&self, status: RunStatus) -> StorageResult<u64>;
}
