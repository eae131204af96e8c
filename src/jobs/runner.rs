//! Worker pool draining the job queue

use crate::config::JobsConfig;
use crate::crawler::{CrawlReport, CrawlScheduler, RemoteFetcher};
use crate::jobs::{Job, JobOutcome, JobReceiver, RetryPolicy};
use crate::storage::{self, RunStatus, SharedStorage};
use crate::ThreadsError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// What finished jobs amounted to
#[derive(Debug, Default)]
pub struct RunnerSummary {
    /// Jobs that eventually succeeded
    pub completed: usize,

    /// Jobs that failed on every attempt
    pub failed: usize,

    /// Reports of successful crawls, in completion order
    pub reports: Vec<CrawlReport>,

    /// Final error of each failed job
    pub errors: Vec<String>,
}

impl RunnerSummary {
    fn record(&mut self, joined: Result<(&'static str, JobResult), JoinError>) {
        match joined {
            Ok((_, Ok(report))) => {
                self.completed += 1;
                self.reports.extend(report);
            }
            Ok((kind, Err(e))) => {
                self.failed += 1;
                self.errors.push(format!("{}: {}", kind, e));
            }
            Err(e) => {
                tracing::error!("Job task aborted: {}", e);
                self.failed += 1;
                self.errors.push(e.to_string());
            }
        }
    }
}

type JobResult = Result<Option<CrawlReport>, ThreadsError>;

/// Executes queued jobs with bounded concurrency
///
/// Every job is wrapped in the runner's `RetryPolicy`. Crawl jobs are also
/// recorded in `crawl_runs`, one row per job across all its attempts.
///
/// A worker permit is held for one attempt at a time. A job waiting out its
/// retry delay does not occupy a worker.
pub struct JobRunner {
    scheduler: Arc<CrawlScheduler>,
    fetcher: Arc<dyn RemoteFetcher>,
    storage: SharedStorage,
    retry: RetryPolicy,
    queue_name: String,
    workers: usize,
    permits: Arc<Semaphore>,
}

impl JobRunner {
    pub fn new(
        scheduler: Arc<CrawlScheduler>,
        fetcher: Arc<dyn RemoteFetcher>,
        storage: SharedStorage,
        config: &JobsConfig,
    ) -> Self {
        let workers = config.workers.max(1) as usize;
        Self {
            scheduler,
            fetcher,
            storage,
            retry: RetryPolicy::from_config(config),
            queue_name: config.queue_name.clone(),
            workers,
            permits: Arc::new(Semaphore::new(workers)),
        }
    }

    /// Replaces the retry policy derived from configuration
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs jobs until the queue is empty and no job is in flight
    ///
    /// Jobs enqueued by running jobs are picked up as well, so this returns
    /// only once a crawl and all the reply fetches it triggered are done.
    pub async fn run_until_idle(self: &Arc<Self>, receiver: &mut JobReceiver) -> RunnerSummary {
        let mut tasks = JoinSet::new();
        let mut summary = RunnerSummary::default();

        tracing::debug!(
            "Draining queue '{}' with {} workers",
            self.queue_name,
            self.workers
        );

        loop {
            while let Ok(job) = receiver.try_recv() {
                self.spawn(&mut tasks, job);
            }

            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                Some(job) = receiver.recv() => self.spawn(&mut tasks, job),
                Some(joined) = tasks.join_next() => summary.record(joined),
                else => break,
            }
        }

        tracing::info!(
            "Queue '{}' idle: {} jobs completed, {} failed",
            self.queue_name,
            summary.completed,
            summary.failed
        );

        summary
    }

    fn spawn(self: &Arc<Self>, tasks: &mut JoinSet<(&'static str, JobResult)>, job: Job) {
        let runner = Arc::clone(self);

        tasks.spawn(async move {
            let kind = job.kind();
            (kind, runner.execute(job).await)
        });
    }

    /// Runs one attempt of a job while holding a worker permit
    async fn attempt<F: Future>(&self, work: F) -> F::Output {
        // The semaphore is never closed
        let _permit = self.permits.acquire().await.ok();
        work.await
    }

    /// Executes one job under the retry policy
    ///
    /// # Returns
    ///
    /// * `Ok(Some(report))` - A crawl job completed
    /// * `Ok(None)` - Any other job completed
    /// * `Err(ThreadsError)` - The last attempt's error
    pub async fn execute(&self, job: Job) -> JobResult {
        match job {
            Job::CrawlReplies { root_id, options } => {
                let run_id = storage::lock(&self.storage)?.create_run(root_id)?;
                let label = format!("crawl_replies:{}", root_id);
                let scheduler = &self.scheduler;
                let options = &options;

                let outcome = self
                    .retry
                    .execute(&label, move || self.attempt(scheduler.run(root_id, options)))
                    .await;

                let attempts = outcome.attempts();
                match outcome {
                    JobOutcome::Completed { value, .. } => {
                        storage::lock(&self.storage)?.finish_run(
                            run_id,
                            RunStatus::Completed,
                            attempts,
                            Some(value.visited.len() as u64),
                            None,
                        )?;
                        Ok(Some(value))
                    }
                    JobOutcome::Exhausted { error, .. } => {
                        tracing::error!(
                            "Crawl of status {} failed after {} attempts: {}",
                            root_id,
                            attempts,
                            error
                        );
                        let message = error.to_string();
                        storage::lock(&self.storage)?.finish_run(
                            run_id,
                            RunStatus::Failed,
                            attempts,
                            None,
                            Some(&message),
                        )?;
                        Err(error)
                    }
                }
            }

            Job::RefreshStatus {
                status_id,
                representation,
            } => {
                let label = format!("refresh_status:{}", status_id);
                let representation = &representation;
                let outcome = self
                    .retry
                    .execute(&label, move || {
                        self.attempt(async move {
                            let mut backend = storage::lock(&self.storage)?;
                            let status = backend.get_status(status_id)?;
                            backend.store_representation(&status.uri, representation)?;
                            Ok::<_, ThreadsError>(())
                        })
                    })
                    .await;
                finish(outcome)
            }

            Job::FetchReply { uri, options } => {
                let label = format!("fetch_reply:{}", uri);
                let uri = uri.as_str();
                let request_id = options.request_id.as_deref().unwrap_or("-");
                let outcome = self
                    .retry
                    .execute(&label, move || {
                        self.attempt(async move {
                            match self.fetcher.fetch(uri, false).await? {
                                Some(representation) => {
                                    storage::lock(&self.storage)?
                                        .store_representation(uri, &representation)?;
                                }
                                None => tracing::debug!(
                                    request_id,
                                    "Reply {} could not be retrieved",
                                    uri
                                ),
                            }
                            Ok::<_, ThreadsError>(())
                        })
                    })
                    .await;
                finish(outcome)
            }
        }
    }
}

fn finish(outcome: JobOutcome<(), ThreadsError>) -> JobResult {
    match outcome {
        JobOutcome::Completed { .. } => Ok(None),
        JobOutcome::Exhausted { error, .. } => Err(error),
    }
}
