//! Integration tests for the reply crawler
//!
//! These tests run the scheduler, the ActivityPub collection fetcher and the
//! job runner against an in-memory federation and an in-memory database.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sumi_threads::config::{
    Config, CrawlerConfig, FetcherConfig, JobsConfig, OutputConfig, UserAgentConfig,
};
use sumi_threads::crawler::{
    crawl_with_fetcher, ActivityPubCollectionFetcher, CrawlScheduler, FetchError, RemoteFetcher,
};
use sumi_threads::jobs::{job_queue, Job, JobDispatcher, JobReceiver};
use sumi_threads::storage::{self, RunStatus, SharedStorage, SqliteStorage, Storage};
use sumi_threads::{CrawlOptions, Representation, ThreadsError};

const ROOT: &str = "https://origin.example/notes/root";

/// A set of remote servers keyed by URI
#[derive(Default)]
struct Federation {
    documents: HashMap<String, Value>,
    broken: Vec<String>,
    requests: Mutex<Vec<(String, bool)>>,
}

impl Federation {
    /// Adds a note whose replies collection is served at `<uri>/replies`
    fn thread(mut self, uri: &str, replies: &[&str]) -> Self {
        let collection = format!("{}/replies", uri);
        self.documents.insert(
            uri.to_string(),
            json!({"id": uri, "type": "Note", "replies": collection}),
        );
        self.documents.insert(
            collection.clone(),
            json!({"id": collection, "type": "OrderedCollection", "orderedItems": replies}),
        );
        self
    }

    /// Adds a note without a replies field
    fn leaf(mut self, uri: &str) -> Self {
        self.documents
            .insert(uri.to_string(), json!({"id": uri, "type": "Note"}));
        self
    }

    /// Makes every request for `uri` fail at the transport level
    fn broken(mut self, uri: &str) -> Self {
        self.broken.push(uri.to_string());
        self
    }

    fn requests_for(&self, uri: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(requested, _)| requested == uri)
            .count()
    }

    /// URIs fetched with `force_refresh`, in request order
    fn forced_requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, forced)| *forced)
            .map(|(uri, _)| uri.clone())
            .collect()
    }

    fn requested(&self, uri: &str) -> bool {
        self.requests_for(uri) > 0
    }
}

#[async_trait]
impl RemoteFetcher for Federation {
    async fn fetch(
        &self,
        uri: &str,
        force_refresh: bool,
    ) -> Result<Option<Representation>, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((uri.to_string(), force_refresh));

        if self.broken.iter().any(|b| b == uri) {
            return Err(FetchError::Transport {
                url: uri.to_string(),
                message: "connection reset".to_string(),
            });
        }

        Ok(self
            .documents
            .get(uri)
            .cloned()
            .and_then(Representation::from_value))
    }
}

struct Harness {
    scheduler: CrawlScheduler,
    federation: Arc<Federation>,
    storage: SharedStorage,
    root_id: i64,
    jobs: JobReceiver,
}

fn harness(federation: Federation, max_replies: usize) -> Harness {
    let mut backend = SqliteStorage::new_in_memory().unwrap();
    let root_id = backend.insert_or_get_status(ROOT).unwrap();
    let storage = storage::shared(backend);

    let federation = Arc::new(federation);
    let fetcher: Arc<dyn RemoteFetcher> = federation.clone();
    let (queue, jobs) = job_queue("pull");
    let dispatcher: Arc<dyn JobDispatcher> = Arc::new(queue);

    let config = CrawlerConfig {
        max_replies,
        max_pages: 10,
    };
    let collections =
        ActivityPubCollectionFetcher::new(fetcher.clone(), dispatcher.clone(), 10, max_replies);
    let scheduler = CrawlScheduler::new(
        &config,
        storage.clone(),
        fetcher,
        Arc::new(collections),
        dispatcher,
    );

    Harness {
        scheduler,
        federation,
        storage,
        root_id,
        jobs,
    }
}

fn test_config(max_replies: usize) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_replies,
            max_pages: 10,
        },
        jobs: JobsConfig {
            queue_name: "pull".to_string(),
            max_attempts: 3,
            base_delay_ms: 20,
            max_delay_ms: 200,
            workers: 4,
        },
        fetcher: FetcherConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: ":memory:".to_string(),
        },
    }
}

fn drain(jobs: &mut JobReceiver) -> Vec<Job> {
    let mut drained = Vec::new();
    while let Ok(job) = jobs.try_recv() {
        drained.push(job);
    }
    drained
}

fn fetched_replies_at(
    storage: &SharedStorage,
    id: i64,
) -> Option<chrono::DateTime<chrono::Utc>> {
    storage::lock(storage)
        .unwrap()
        .get_status(id)
        .unwrap()
        .fetched_replies_at
}

fn reply(n: usize) -> String {
    format!("https://remote.example/notes/{}", n)
}

#[tokio::test]
async fn test_root_without_replies_field() {
    let mut h = harness(Federation::default().leaf(ROOT), 1000);

    let report = h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();

    assert!(report.visited.is_empty());
    assert!(report.fetched_replies_at.is_none());
    assert!(fetched_replies_at(&h.storage, h.root_id).is_none());

    let jobs = drain(&mut h.jobs);
    assert_eq!(jobs.len(), 1);
    assert!(matches!(
        &jobs[0],
        Job::RefreshStatus { status_id, .. } if *status_id == h.root_id
    ));
}

#[tokio::test]
async fn test_root_with_five_leaf_replies() {
    let replies: Vec<String> = (1..=5).map(reply).collect();
    let reply_refs: Vec<&str> = replies.iter().map(String::as_str).collect();

    let mut federation = Federation::default().thread(ROOT, &reply_refs);
    for uri in &replies {
        federation = federation.leaf(uri);
    }
    let mut h = harness(federation, 1000);

    let report = h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();

    assert_eq!(report.visited.len(), 5);
    assert_eq!(report.iterations, 5);
    assert_eq!(report.failed_branches, 0);
    assert!(!report.cap_reached);

    let jobs = drain(&mut h.jobs);
    let refreshes = jobs
        .iter()
        .filter(|j| matches!(j, Job::RefreshStatus { .. }))
        .count();
    let fetches = jobs
        .iter()
        .filter(|j| matches!(j, Job::FetchReply { .. }))
        .count();
    assert_eq!(refreshes, 1);
    assert_eq!(fetches, 5);
}

#[tokio::test]
async fn test_root_is_refetched_and_replies_may_be_cached() {
    let b = "https://b.example/notes/b";
    let c = "https://c.example/notes/c";
    let federation = Federation::default()
        .thread(ROOT, &[b])
        .thread(b, &[c])
        .leaf(c);
    let h = harness(federation, 1000);

    h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();

    // Only the root bypasses caches; nodes and collection pages do not
    assert_eq!(h.federation.forced_requests(), vec![ROOT.to_string()]);
    assert!(h.federation.requested(b));
    assert!(h.federation.requested(&format!("{}/replies", b)));
    assert!(h.federation.requested(c));
}

#[tokio::test]
async fn test_cycle_back_to_visited_ancestor_terminates() {
    let b = "https://b.example/notes/b";
    let c = "https://c.example/notes/c";
    let d = "https://d.example/notes/d";
    let federation = Federation::default()
        .thread(ROOT, &[b])
        .thread(b, &[c])
        .thread(c, &[b, d])
        .leaf(d);
    let h = harness(federation, 1000);

    let report = h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();

    assert_eq!(report.visited.len(), 3);
    assert_eq!(report.iterations, 3);
    assert_eq!(h.federation.requests_for(&format!("{}/replies", b)), 1);
}

#[tokio::test]
async fn test_cycle_through_root_terminates() {
    let b = "https://b.example/notes/b";
    let federation = Federation::default().thread(ROOT, &[b]).thread(b, &[ROOT]);
    let h = harness(federation, 1000);

    let report = h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();

    // The root counts once it shows up as somebody's reply
    assert_eq!(report.visited.len(), 2);
    assert!(report.visited.contains(ROOT));
}

#[tokio::test]
async fn test_dedup_across_parents() {
    let b = "https://b.example/notes/b";
    let c = "https://c.example/notes/c";
    let d = "https://d.example/notes/d";
    let federation = Federation::default()
        .thread(ROOT, &[b, c])
        .thread(b, &[d])
        .thread(c, &[d])
        .leaf(d);
    let h = harness(federation, 1000);

    let report = h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();

    assert_eq!(report.visited.len(), 3);
    // d is expanded once even though two parents list it
    assert_eq!(h.federation.requests_for(d), 1);
}

#[tokio::test]
async fn test_duplicate_reply_jobs_store_one_status() {
    let b = "https://b.example/notes/b";
    let c = "https://c.example/notes/c";
    let d = "https://d.example/notes/d";
    let federation = Federation::default()
        .thread(ROOT, &[b, c])
        .thread(b, &[d])
        .thread(c, &[d])
        .leaf(d);

    let mut backend = SqliteStorage::new_in_memory().unwrap();
    let root_id = backend.insert_or_get_status(ROOT).unwrap();
    let storage = storage::shared(backend);

    let summary = crawl_with_fetcher(
        &test_config(1000),
        storage.clone(),
        Arc::new(federation),
        root_id,
        CrawlOptions::with_request_id("dedup"),
    )
    .await
    .unwrap();

    assert_eq!(summary.failed, 0);
    assert_eq!(summary.reports.len(), 1);

    let storage = storage::lock(&storage).unwrap();
    assert_eq!(storage.count_statuses().unwrap(), 4);
    assert_eq!(storage.count_fetched_statuses().unwrap(), 4);
    assert!(storage.get_status_by_uri(d).unwrap().is_some());
}

#[tokio::test]
async fn test_debounce_timestamp_touched_once_per_run() {
    let federation = Federation::default()
        .thread(ROOT, &["https://b.example/notes/b"])
        .leaf("https://b.example/notes/b");
    let h = harness(federation, 1000);

    let first = h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();
    let stored = fetched_replies_at(&h.storage, h.root_id);
    assert!(stored.is_some());
    assert_eq!(stored, first.fetched_replies_at);

    let second = h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();
    let restored = fetched_replies_at(&h.storage, h.root_id);
    assert_eq!(restored, second.fetched_replies_at);
    assert!(restored >= stored);
}

#[tokio::test]
async fn test_root_transport_failure_retried_then_failed() {
    let federation = Arc::new(Federation::default().broken(ROOT));

    let mut backend = SqliteStorage::new_in_memory().unwrap();
    let root_id = backend.insert_or_get_status(ROOT).unwrap();
    let storage = storage::shared(backend);

    let started = Instant::now();
    let summary = crawl_with_fetcher(
        &test_config(1000),
        storage.clone(),
        federation.clone(),
        root_id,
        CrawlOptions::default(),
    )
    .await
    .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(summary.completed, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(federation.requests_for(ROOT), 3);
    // 20ms before the second attempt, 40ms before the third
    assert!(elapsed >= Duration::from_millis(60));

    let storage = storage::lock(&storage).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.attempts, 3);
    assert!(run.error_message.unwrap().contains("connection reset"));
    assert!(storage.get_status(root_id).unwrap().fetched_replies_at.is_none());
}

#[tokio::test]
async fn test_root_transport_failure_is_an_error() {
    let h = harness(Federation::default().broken(ROOT), 1000);

    let result = h.scheduler.run(h.root_id, &CrawlOptions::default()).await;

    assert!(matches!(result, Err(ThreadsError::Fetch(_))));
}

#[tokio::test]
async fn test_broken_branch_does_not_abort_run() {
    let b = "https://b.example/notes/b";
    let c = "https://c.example/notes/c";
    let federation = Federation::default()
        .thread(ROOT, &[b, c])
        .broken(b)
        .leaf(c);
    let h = harness(federation, 1000);

    let report = h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();

    assert_eq!(report.visited.len(), 2);
    assert_eq!(report.failed_branches, 1);
}

#[tokio::test]
async fn test_global_cap_halts_crawl() {
    // 5 children with 9 replies each: 50 reachable replies
    let children: Vec<String> = (1..=5).map(reply).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();

    let mut federation = Federation::default().thread(ROOT, &child_refs);
    let mut grandchildren = Vec::new();
    for (i, child) in children.iter().enumerate() {
        let replies: Vec<String> = (0..9).map(|j| reply(100 + i * 10 + j)).collect();
        let reply_refs: Vec<&str> = replies.iter().map(String::as_str).collect();
        federation = federation.thread(child, &reply_refs);
        grandchildren.extend(replies);
    }
    for uri in &grandchildren {
        federation = federation.leaf(uri);
    }
    let h = harness(federation, 10);

    let report = h.scheduler.run(h.root_id, &CrawlOptions::default()).await.unwrap();

    assert!(report.cap_reached);
    assert!(report.visited.len() >= 10);
    // Overshoot is bounded by one batch
    assert!(report.visited.len() < 10 + 9);
    assert_eq!(report.iterations, 1);
    assert!(report.pending > 0);

    // Only the most recently discovered child was expanded
    let expanded = children
        .iter()
        .filter(|child| h.federation.requested(&format!("{}/replies", child)))
        .count();
    assert_eq!(expanded, 1);
    assert!(grandchildren.iter().all(|g| !h.federation.requested(g)));
}

#[tokio::test]
async fn test_options_forwarded_to_reply_jobs() {
    let b = "https://b.example/notes/b";
    let federation = Federation::default().thread(ROOT, &[b]).leaf(b);
    let mut h = harness(federation, 1000);

    h.scheduler
        .run(h.root_id, &CrawlOptions::with_request_id("req-42"))
        .await
        .unwrap();

    let forwarded = drain(&mut h.jobs).into_iter().any(|job| match job {
        Job::FetchReply { uri, options } => {
            uri == b && options.request_id.as_deref() == Some("req-42")
        }
        _ => false,
    });
    assert!(forwarded);
}
