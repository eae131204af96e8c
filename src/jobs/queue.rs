use crate::jobs::{Job, JobDispatcher, JobError};
use tokio::sync::mpsc;

/// Receiving half of an in-process job queue
pub type JobReceiver = mpsc::UnboundedReceiver<Job>;

/// Sending half of an in-process job queue
#[derive(Debug, Clone)]
pub struct JobQueue {
    name: String,
    tx: mpsc::UnboundedSender<Job>,
}

/// Creates a named in-process queue
pub fn job_queue(name: impl Into<String>) -> (JobQueue, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        JobQueue {
            name: name.into(),
            tx,
        },
        rx,
    )
}

impl JobDispatcher for JobQueue {
    fn enqueue(&self, job: Job) -> Result<(), JobError> {
        tracing::trace!(queue = %self.name, kind = job.kind(), "Enqueueing job");
        self.tx
            .send(job)
            .map_err(|_| JobError::QueueClosed(self.name.clone()))
    }
}
