//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Threads database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Known posts: crawl roots and every reply fetched for them
CREATE TABLE IF NOT EXISTS statuses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uri TEXT NOT NULL UNIQUE,
    representation TEXT,
    fetched_at TEXT,
    fetched_replies_at TEXT,
    discovered_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_statuses_uri ON statuses(uri);

-- One row per crawl job, across all of its attempts
CREATE TABLE IF NOT EXISTS crawl_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    root_id INTEGER NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    visited_count INTEGER,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_crawl_runs_root ON crawl_runs(root_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
