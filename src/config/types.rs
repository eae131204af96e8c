use serde::Deserialize;

/// Main configuration structure for Sumi-Threads
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Reply-graph traversal limits
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of distinct replies a single crawl run may visit
    #[serde(rename = "max-replies", default = "default_max_replies")]
    pub max_replies: usize,

    /// Maximum number of collection pages consumed per expansion
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_replies: default_max_replies(),
            max_pages: default_max_pages(),
        }
    }
}

/// Job queue and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Queue name crawl jobs are attributed to
    #[serde(rename = "queue-name", default = "default_queue_name")]
    pub queue_name: String,

    /// Total attempts per job, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for the retry delay (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Number of jobs executed concurrently
    #[serde(default = "default_workers")]
    pub workers: u32,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            queue_name: default_queue_name(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            workers: default_workers(),
        }
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Refuse plain-HTTP requests
    #[serde(rename = "https-only", default = "default_https_only")]
    pub https_only: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            https_only: default_https_only(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_max_replies() -> usize {
    1000
}

fn default_max_pages() -> u32 {
    10
}

fn default_queue_name() -> String {
    "pull".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_workers() -> u32 {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_https_only() -> bool {
    true
}
