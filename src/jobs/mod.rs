//! Background jobs
//!
//! This module contains:
//! - The `Job` payloads exchanged between the crawler and its workers
//! - The `JobDispatcher` seam used to enqueue follow-up work
//! - An in-process queue, the retry policy and the worker pool

mod queue;
mod retry;
mod runner;

pub use queue::{job_queue, JobQueue, JobReceiver};
pub use retry::{JobOutcome, RetryPolicy};
pub use runner::{JobRunner, RunnerSummary};

use crate::activitypub::{CrawlOptions, Representation};
use thiserror::Error;

/// Work items processed by the job runner
#[derive(Debug, Clone)]
pub enum Job {
    /// Crawl the reply graph below a locally known root
    CrawlReplies { root_id: i64, options: CrawlOptions },

    /// Persist an already-fetched representation of a known status
    RefreshStatus {
        status_id: i64,
        representation: Representation,
    },

    /// Fetch and persist a single reply
    FetchReply { uri: String, options: CrawlOptions },
}

impl Job {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CrawlReplies { .. } => "crawl_replies",
            Self::RefreshStatus { .. } => "refresh_status",
            Self::FetchReply { .. } => "fetch_reply",
        }
    }
}

/// Job infrastructure errors
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job queue '{0}' is closed")]
    QueueClosed(String),
}

/// Enqueues jobs for asynchronous execution
///
/// Enqueueing never waits for the job to run.
pub trait JobDispatcher: Send + Sync {
    fn enqueue(&self, job: Job) -> Result<(), JobError>;
}
