//! Sumi-Threads: a federated reply-thread crawler
//!
//! This crate walks the reply graph of an ActivityPub post: starting from a
//! locally known root, it follows `replies` collections across remote servers,
//! deduplicating visited nodes and stopping at a configurable global cap.

pub mod activitypub;
pub mod config;
pub mod crawler;
pub mod jobs;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Threads operations
#[derive(Debug, Error)]
pub enum ThreadsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Root representation unavailable for {uri}")]
    RootUnavailable { uri: String },

    #[error("Job error: {0}")]
    Job(#[from] jobs::JobError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Sumi-Threads operations
pub type Result<T> = std::result::Result<T, ThreadsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use activitypub::{CrawlOptions, RepliesPointer, Representation};
pub use config::Config;
pub use crawler::{CrawlReport, CrawlScheduler};
pub use state::{Frontier, VisitedSet};
