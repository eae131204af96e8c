//! Whole-job retry with exponential backoff
//!
//! A job is attempted up to `max_attempts` times in total. The delay before
//! attempt `n` (n >= 2) is `base_delay * multiplier^(n - 2)`, capped at
//! `max_delay`. After the last failed attempt the job is given up for good.

use crate::config::JobsConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry behaviour applied around job execution
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,

    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

/// Final result of a retried job
#[derive(Debug)]
pub enum JobOutcome<T, E> {
    Completed { value: T, attempts: u32 },
    Exhausted { error: E, attempts: u32 },
}

impl<T, E> JobOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Completed { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

impl RetryPolicy {
    pub fn from_config(config: &JobsConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: 2.0,
        }
    }

    /// Delay to wait before the given (1-based) attempt
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let factor = self.multiplier.powi(attempt as i32 - 2);
        let millis = self.base_delay.as_millis() as f64 * factor;
        Duration::from_millis(millis as u64).min(self.max_delay)
    }

    /// Runs `operation` until it succeeds or attempts are exhausted
    pub async fn execute<T, E, F, Fut>(&self, label: &str, mut operation: F) -> JobOutcome<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if attempt > 1 {
                let delay = self.delay_before(attempt);
                debug!(
                    job = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying job after delay"
                );
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(job = label, attempt, "Job succeeded after retry");
                    }
                    return JobOutcome::Completed {
                        value,
                        attempts: attempt,
                    };
                }
                Err(error) if attempt >= max_attempts => {
                    warn!(job = label, attempt, error = %error, "Job failed permanently");
                    return JobOutcome::Exhausted {
                        error,
                        attempts: attempt,
                    };
                }
                Err(error) => {
                    warn!(
                        job = label,
                        attempt,
                        max_attempts,
                        error = %error,
                        "Job attempt failed"
                    );
                }
            }

            attempt += 1;
        }
    }
}
