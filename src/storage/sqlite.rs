//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::activitypub::Representation;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, StatusRecord};
use crate::ThreadsError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const STATUS_COLUMNS: &str =
    "id, uri, representation, fetched_at, fetched_replies_at, discovered_at";

const RUN_COLUMNS: &str =
    "id, root_id, started_at, finished_at, status, attempts, visited_count, error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates a database file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ThreadsError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ThreadsError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, ThreadsError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| s.parse::<DateTime<Utc>>().ok())
}

fn status_from_row(row: &Row<'_>) -> rusqlite::Result<StatusRecord> {
    let representation: Option<String> = row.get(2)?;
    Ok(StatusRecord {
        id: row.get(0)?,
        uri: row.get(1)?,
        representation: representation.as_deref().and_then(Representation::from_json),
        fetched_at: row.get(3)?,
        fetched_replies_at: parse_timestamp(row.get(4)?),
        discovered_at: row.get(5)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        root_id: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Failed),
        attempts: row.get(5)?,
        visited_count: row.get::<_, Option<i64>>(6)?.map(|n| n as u64),
        error_message: row.get(7)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Statuses =====

    fn insert_or_get_status(&mut self, uri: &str) -> StorageResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM statuses WHERE uri = ?1",
                params![uri],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO statuses (uri, discovered_at) VALUES (?1, ?2)",
            params![uri, now],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_status(&self, id: i64) -> StorageResult<StatusRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM statuses WHERE id = ?1", STATUS_COLUMNS),
                params![id],
                status_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::StatusNotFound(format!("Status ID {}", id)))
    }

    fn get_status_by_uri(&self, uri: &str) -> StorageResult<Option<StatusRecord>> {
        let status = self
            .conn
            .query_row(
                &format!("SELECT {} FROM statuses WHERE uri = ?1", STATUS_COLUMNS),
                params![uri],
                status_from_row,
            )
            .optional()?;
        Ok(status)
    }

    fn store_representation(
        &mut self,
        uri: &str,
        representation: &Representation,
    ) -> StorageResult<i64> {
        let id = self.insert_or_get_status(uri)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE statuses SET representation = ?1, fetched_at = ?2 WHERE id = ?3",
            params![representation.to_json(), now, id],
        )?;
        Ok(id)
    }

    fn touch_fetched_replies_at(&mut self, id: i64) -> StorageResult<DateTime<Utc>> {
        let now = Utc::now();
        let updated = self.conn.execute(
            "UPDATE statuses SET fetched_replies_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id],
        )?;

        if updated == 0 {
            return Err(StorageError::StatusNotFound(format!("Status ID {}", id)));
        }

        Ok(now)
    }

    // ===== Run Tracking =====

    fn create_run(&mut self, root_id: i64) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_runs (root_id, started_at, status) VALUES (?1, ?2, ?3)",
            params![root_id, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        attempts: u32,
        visited_count: Option<u64>,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2, attempts = ?3,
             visited_count = ?4, error_message = ?5 WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                attempts,
                visited_count.map(|n| n as i64),
                error_message,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }

        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM crawl_runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM crawl_runs ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    // ===== Statistics =====

    fn count_statuses(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM statuses", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_fetched_statuses(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM statuses WHERE representation IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_crawled_roots(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM statuses WHERE fetched_replies_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_runs_by_status(&self, status: RunStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawl_runs WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
