//! Reply-graph crawl orchestration
//!
//! This module drives one crawl for one root post:
//! - Fetches the root's representation and hands it to a follow-up job
//! - Seeds the frontier from the root's replies collection
//! - Expands the frontier one node at a time until it empties or the
//!   visited set reaches the global cap
//! - Stamps the root's `fetched_replies_at` debounce marker

use crate::activitypub::CrawlOptions;
use crate::config::CrawlerConfig;
use crate::crawler::{CollectionFetcher, CollectionResolver, RemoteFetcher, Resolution};
use crate::jobs::{Job, JobDispatcher};
use crate::state::{Frontier, VisitedSet};
use crate::storage::{self, SharedStorage};
use crate::url::host_of;
use crate::ThreadsError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Local ID of the root post
    pub root_id: i64,

    /// URI of the root post
    pub root_uri: String,

    /// Every reply enqueued during the run, in discovery order
    pub visited: VisitedSet,

    /// Number of frontier entries expanded
    pub iterations: usize,

    /// Replies whose representation could not be fetched
    pub failed_branches: usize,

    /// Whether the visited set reached the configured cap
    pub cap_reached: bool,

    /// Replies discovered but never expanded
    pub pending: usize,

    /// New value of the root's debounce marker; None when no crawl happened
    pub fetched_replies_at: Option<DateTime<Utc>>,
}

impl CrawlReport {
    fn empty(root_id: i64, root_uri: String) -> Self {
        Self {
            root_id,
            root_uri,
            visited: VisitedSet::new(),
            iterations: 0,
            failed_branches: 0,
            cap_reached: false,
            pending: 0,
            fetched_replies_at: None,
        }
    }

    /// Visited replies per remote host
    pub fn hosts(&self) -> BTreeMap<String, usize> {
        let mut hosts = BTreeMap::new();
        for uri in self.visited.iter() {
            let host = host_of(uri).unwrap_or_else(|| "unknown".to_string());
            *hosts.entry(host).or_insert(0) += 1;
        }
        hosts
    }
}

/// Crawls the reply graph below a root post
///
/// The expansion is a work-list, never recursion: the frontier is popped from
/// the end (most recently discovered first) and the cap is checked between
/// expansions, so one expansion may carry the visited set past the cap by at
/// most one batch.
///
/// A scheduler holds no per-run state and can serve concurrent runs.
pub struct CrawlScheduler {
    storage: SharedStorage,
    fetcher: Arc<dyn RemoteFetcher>,
    collections: Arc<dyn CollectionFetcher>,
    dispatcher: Arc<dyn JobDispatcher>,
    max_replies: usize,
}

impl CrawlScheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - Crawler limits; `max_replies` is the global cap
    /// * `storage` - Where root posts are looked up and stamped
    /// * `fetcher` - Dereferences nodes
    /// * `collections` - Expands replies collections
    /// * `dispatcher` - Receives the follow-up job for the root
    pub fn new(
        config: &CrawlerConfig,
        storage: SharedStorage,
        fetcher: Arc<dyn RemoteFetcher>,
        collections: Arc<dyn CollectionFetcher>,
        dispatcher: Arc<dyn JobDispatcher>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            collections,
            dispatcher,
            max_replies: config.max_replies,
        }
    }

    /// Runs a complete crawl for `root_id`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl finished, possibly with failed branches
    /// * `Err(ThreadsError)` - The root is unknown locally or its
    ///   representation could not be fetched
    pub async fn run(
        &self,
        root_id: i64,
        options: &CrawlOptions,
    ) -> Result<CrawlReport, ThreadsError> {
        let root = storage::lock(&self.storage)?.get_status(root_id)?;
        let start_time = Instant::now();

        tracing::info!("Crawling replies of {} (status {})", root.uri, root.id);

        let representation = match self.fetcher.fetch(&root.uri, true).await {
            Ok(Some(representation)) => representation,
            Ok(None) => {
                return Err(ThreadsError::RootUnavailable {
                    uri: root.uri.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let refresh = Job::RefreshStatus {
            status_id: root.id,
            representation: representation.clone(),
        };
        if let Err(e) = self.dispatcher.enqueue(refresh) {
            tracing::warn!("Could not enqueue refresh of {}: {}", root.uri, e);
        }

        let resolver = CollectionResolver::new(self.fetcher.as_ref(), &root.uri);

        let pointer = match resolver
            .replies_pointer(&root.uri, Some(&representation))
            .await?
        {
            Resolution::Found(pointer) => pointer,
            Resolution::Leaf => {
                tracing::info!("{} has no replies collection", root.uri);
                return Ok(CrawlReport::empty(root.id, root.uri));
            }
            // The representation is passed in, so nothing is fetched and a
            // root failure would already have surfaced as an error
            Resolution::Unavailable => {
                return Err(ThreadsError::RootUnavailable { uri: root.uri });
            }
        };

        let first_batch = self
            .collections
            .expand(&pointer, options.clone())
            .await
            .unwrap_or_default();

        let fetched_replies_at =
            storage::lock(&self.storage)?.touch_fetched_replies_at(root.id)?;

        let mut visited = VisitedSet::new();
        let mut frontier = Frontier::new();
        frontier.extend_unvisited(&first_batch, &mut visited);

        let mut iterations = 0;
        let mut failed_branches = 0;

        while !frontier.is_empty() && visited.len() < self.max_replies {
            let Some(uri) = frontier.pop() else {
                break;
            };
            if uri.is_empty() {
                continue;
            }
            iterations += 1;

            let pointer = match resolver.replies_pointer(&uri, None).await? {
                Resolution::Found(pointer) => pointer,
                Resolution::Leaf => continue,
                Resolution::Unavailable => {
                    failed_branches += 1;
                    continue;
                }
            };

            let Some(children) = self.collections.expand(&pointer, options.clone()).await
            else {
                tracing::debug!("Replies of {} could not be resolved", uri);
                continue;
            };

            let added = frontier.extend_unvisited(&children, &mut visited);
            tracing::debug!(
                "Expanded {}: {} replies, {} new, {} visited, {} pending",
                uri,
                children.len(),
                added,
                visited.len(),
                frontier.len()
            );
        }

        let cap_reached = visited.len() >= self.max_replies;
        if cap_reached && !frontier.is_empty() {
            tracing::info!(
                "Reached cap of {} replies for {}, leaving {} unexpanded",
                self.max_replies,
                root.uri,
                frontier.len()
            );
        }

        tracing::info!(
            "Crawl of {} finished: {} replies in {} expansions ({} failed) in {:?}",
            root.uri,
            visited.len(),
            iterations,
            failed_branches,
            start_time.elapsed()
        );

        Ok(CrawlReport {
            root_id: root.id,
            root_uri: root.uri,
            visited,
            iterations,
            failed_branches,
            cap_reached,
            pending: frontier.len(),
            fetched_replies_at: Some(fetched_replies_at),
        })
    }
}
