//! Output module for reporting crawl results
//!
//! This module handles:
//! - Printing the outcome of a crawl
//! - Recording and displaying database statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, ThreadStatistics};

use crate::crawler::CrawlReport;
use crate::jobs::RunnerSummary;

/// Prints the outcome of draining a crawl's job queue
pub fn print_runner_summary(summary: &RunnerSummary) {
    for report in &summary.reports {
        print_crawl_report(report);
        println!();
    }

    println!(
        "Jobs: {} completed, {} failed",
        summary.completed, summary.failed
    );
    for error in &summary.errors {
        println!("  - {}", error);
    }
}

/// Prints a single crawl report
pub fn print_crawl_report(report: &CrawlReport) {
    println!("=== Replies of {} ===\n", report.root_uri);

    println!("  Replies visited: {}", report.visited.len());
    println!("  Expansions: {}", report.iterations);
    println!("  Unreachable branches: {}", report.failed_branches);
    if report.cap_reached {
        println!("  Cap reached, {} replies left unexpanded", report.pending);
    }
    if let Some(at) = report.fetched_replies_at {
        println!("  Replies fetched at: {}", at.to_rfc3339());
    }

    let hosts = report.hosts();
    if !hosts.is_empty() {
        println!("\nHosts ({}):", hosts.len());
        let mut host_counts: Vec<_> = hosts.iter().collect();
        host_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (host, count) in host_counts {
            println!("  - {}: {}", host, count);
        }
    }
}
