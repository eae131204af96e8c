//! Sumi-Threads main entry point
//!
//! This is the command-line interface for the Sumi-Threads reply crawler.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use sumi_threads::config::{load_config_with_hash, Config};
use sumi_threads::crawler::{crawl, HttpFetcher, RemoteFetcher};
use sumi_threads::output::{load_statistics, print_runner_summary, print_statistics};
use sumi_threads::storage::{self, SharedStorage, SqliteStorage};
use sumi_threads::CrawlOptions;
use tracing_subscriber::EnvFilter;

/// Sumi-Threads: a federated reply-thread crawler
///
/// Sumi-Threads follows the `replies` collections of an ActivityPub post
/// across remote servers and stores every reply it can retrieve.
#[derive(Parser, Debug)]
#[command(name = "sumi-threads")]
#[command(version)]
#[command(about = "A federated reply-thread crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a post and register it as a crawl root
    Track {
        /// URI of the post
        uri: String,
    },

    /// Crawl the replies of a tracked post
    Crawl {
        /// Local ID or URI of the root post
        root: String,

        /// Crawl even if replies were fetched recently
        #[arg(long)]
        force: bool,

        /// Skip roots whose replies were fetched less than this many seconds ago
        #[arg(long, default_value_t = 900)]
        debounce_secs: i64,
    },

    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))?;

    match cli.command {
        Command::Track { uri } => handle_track(&config, storage, &uri).await,
        Command::Crawl {
            root,
            force,
            debounce_secs,
        } => handle_crawl(&config, storage, &root, force, debounce_secs).await,
        Command::Stats => handle_stats(&config, &storage),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_threads=info,warn"),
            1 => EnvFilter::new("sumi_threads=debug,info"),
            2 => EnvFilter::new("sumi_threads=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `track`: fetches a post and stores it as a known status
async fn handle_track(
    config: &Config,
    mut storage: SqliteStorage,
    uri: &str,
) -> anyhow::Result<()> {
    use sumi_threads::storage::Storage;

    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.fetcher)?;

    let id = match fetcher.fetch(uri, true).await? {
        Some(representation) => storage.store_representation(uri, &representation)?,
        None => {
            tracing::warn!("{} could not be retrieved, tracking it without content", uri);
            storage.insert_or_get_status(uri)?
        }
    };

    println!("✓ Tracking {} as status {}", uri, id);
    Ok(())
}

/// Handles `crawl`: runs a reply crawl for one root and waits for its jobs
async fn handle_crawl(
    config: &Config,
    storage: SqliteStorage,
    root: &str,
    force: bool,
    debounce_secs: i64,
) -> anyhow::Result<()> {
    use sumi_threads::storage::Storage;

    let status = match root.parse::<i64>() {
        Ok(id) => storage.get_status(id)?,
        Err(_) => match storage.get_status_by_uri(root)? {
            Some(status) => status,
            None => bail!("{} is not tracked; run `track` first", root),
        },
    };

    if !force
        && status.replies_fetched_within(chrono::Duration::seconds(debounce_secs), Utc::now())
    {
        println!(
            "Replies of {} were fetched recently; use --force to crawl anyway",
            status.uri
        );
        return Ok(());
    }

    tracing::info!(
        "Crawling up to {} replies of {}",
        config.crawler.max_replies,
        status.uri
    );

    let shared: SharedStorage = storage::shared(storage);
    let request_id = format!("cli-{}", Utc::now().timestamp_millis());
    let options = CrawlOptions::with_request_id(request_id);

    let summary = crawl(config, shared, status.id, options).await?;
    print_runner_summary(&summary);

    if summary.reports.is_empty() {
        bail!("Crawl of {} failed", status.uri);
    }

    Ok(())
}

/// Handles `stats`: shows statistics from the database
fn handle_stats(config: &Config, storage: &SqliteStorage) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let stats = load_statistics(storage)?;
    print_statistics(&stats);

    Ok(())
}
