//! Storage module for persisting posts and crawl runs
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Status lookup and representation snapshots
//! - The `fetched_replies_at` debounce marker
//! - Crawl run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::activitypub::Representation;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared between the scheduler and job workers
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Wraps a backend into a `SharedStorage`
pub fn shared<S: Storage + Send + 'static>(storage: S) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks a shared storage handle
pub fn lock(
    storage: &SharedStorage,
) -> StorageResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// A locally known post
#[derive(Debug, Clone)]
pub struct StatusRecord {
    pub id: i64,
    pub uri: String,
    pub representation: Option<Representation>,
    pub fetched_at: Option<String>,
    pub fetched_replies_at: Option<DateTime<Utc>>,
    pub discovered_at: String,
}

impl StatusRecord {
    /// Returns true if replies were crawled less than `debounce` ago
    pub fn replies_fetched_within(&self, debounce: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.fetched_replies_at
            .map(|at| now - at < debounce)
            .unwrap_or(false)
    }
}

/// A crawl job, across all its attempts
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub root_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub attempts: u32,
    pub visited_count: Option<u64>,
    pub error_message: Option<String>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Running,
    Completed,
    /// Every attempt failed; the job will not be retried again
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
