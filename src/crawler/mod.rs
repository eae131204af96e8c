//! Crawler module for walking reply threads
//!
//! This module contains the core crawling logic, including:
//! - Dereferencing remote nodes over HTTP
//! - Resolving and paging through replies collections
//! - The per-root work-list crawl

mod collection;
mod fetcher;
mod resolver;
mod scheduler;

pub use collection::{ActivityPubCollectionFetcher, CollectionFetcher};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, RemoteFetcher};
pub use resolver::{CollectionResolver, Resolution};
pub use scheduler::{CrawlReport, CrawlScheduler};

use crate::activitypub::CrawlOptions;
use crate::config::Config;
use crate::jobs::{job_queue, Job, JobDispatcher, JobRunner, RunnerSummary};
use crate::storage::SharedStorage;
use crate::ThreadsError;
use std::sync::Arc;

/// Crawls the replies of a single root and waits for all follow-up jobs
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the HTTP fetcher from the configuration
/// 2. Enqueue a `CrawlReplies` job for the root
/// 3. Run the job queue until every reply fetch has completed
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `storage` - Where statuses and runs are recorded
/// * `root_id` - Local ID of the root post
/// * `options` - Passed unchanged to every collection expansion
pub async fn crawl(
    config: &Config,
    storage: SharedStorage,
    root_id: i64,
    options: CrawlOptions,
) -> Result<RunnerSummary, ThreadsError> {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.fetcher)?;
    crawl_with_fetcher(config, storage, Arc::new(fetcher), root_id, options).await
}

/// Same as [`crawl`], with a caller-supplied fetcher
pub async fn crawl_with_fetcher(
    config: &Config,
    storage: SharedStorage,
    fetcher: Arc<dyn RemoteFetcher>,
    root_id: i64,
    options: CrawlOptions,
) -> Result<RunnerSummary, ThreadsError> {
    let (queue, mut receiver) = job_queue(config.jobs.queue_name.clone());
    let dispatcher: Arc<dyn JobDispatcher> = Arc::new(queue);

    let collections = ActivityPubCollectionFetcher::new(
        fetcher.clone(),
        dispatcher.clone(),
        config.crawler.max_pages,
        config.crawler.max_replies,
    );
    let scheduler = CrawlScheduler::new(
        &config.crawler,
        storage.clone(),
        fetcher.clone(),
        Arc::new(collections),
        dispatcher.clone(),
    );
    let runner = Arc::new(JobRunner::new(
        Arc::new(scheduler),
        fetcher,
        storage,
        &config.jobs,
    ));

    dispatcher.enqueue(Job::CrawlReplies { root_id, options })?;

    Ok(runner.run_until_idle(&mut receiver).await)
}
