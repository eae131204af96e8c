//! Statistics generation from the thread database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::{RunRecord, RunStatus, Storage};
use crate::ThreadsError;
use std::collections::HashMap;

/// Thread database statistics summary
#[derive(Debug, Clone)]
pub struct ThreadStatistics {
    /// Total number of known statuses
    pub total_statuses: u64,

    /// Statuses with a stored representation
    pub fetched_statuses: u64,

    /// Roots whose replies were crawled at least once
    pub crawled_roots: u64,

    /// Count of crawl runs by status
    pub runs_by_status: HashMap<RunStatus, u64>,

    /// Most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(ThreadStatistics)` - Successfully loaded statistics
/// * `Err(ThreadsError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<ThreadStatistics, ThreadsError> {
    let total_statuses = storage.count_statuses()?;
    let fetched_statuses = storage.count_fetched_statuses()?;
    let crawled_roots = storage.count_crawled_roots()?;

    let mut runs_by_status = HashMap::new();
    for status in [RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
        let count = storage.count_runs_by_status(status)?;
        if count > 0 {
            runs_by_status.insert(status, count);
        }
    }

    let latest_run = storage.get_latest_run()?;

    Ok(ThreadStatistics {
        total_statuses,
        fetched_statuses,
        crawled_roots,
        runs_by_status,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ThreadStatistics) {
    println!("=== Thread Statistics ===\n");

    println!("Overview:");
    println!("  Known statuses: {}", stats.total_statuses);
    println!("  Fetched statuses: {}", stats.fetched_statuses);
    println!("  Crawled roots: {}", stats.crawled_roots);
    println!();

    if !stats.runs_by_status.is_empty() {
        println!("Crawl Runs:");
        let mut run_counts: Vec<_> = stats.runs_by_status.iter().collect();
        run_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (status, count) in run_counts {
            println!("  {}: {}", status.to_db_string(), count);
        }
        println!();
    }

    if let Some(run) = &stats.latest_run {
        println!("Latest Run (#{}):", run.id);
        println!("  Root status: {}", run.root_id);
        println!("  Started: {}", run.started_at);
        if let Some(finished_at) = &run.finished_at {
            println!("  Finished: {}", finished_at);
        }
        println!("  Status: {}", run.status.to_db_string());
        println!("  Attempts: {}", run.attempts);
        if let Some(visited) = run.visited_count {
            println!("  Replies visited: {}", visited);
        }
        if let Some(error) = &run.error_message {
            println!("  Error: {}", error);
        }
    }

    let coverage = if stats.total_statuses > 0 {
        (stats.fetched_statuses as f64 / stats.total_statuses as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "\nFetch Coverage: {:.1}% ({} / {} statuses have a representation)",
        coverage, stats.fetched_statuses, stats.total_statuses
    );
}
