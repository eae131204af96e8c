//! Remote node fetching
//!
//! This module handles dereferencing ActivityPub nodes over HTTP:
//! - Building the HTTP client with a descriptive user agent
//! - Content negotiation for ActivityStreams JSON
//! - Classifying failures into "nothing there" and transport errors

use crate::activitypub::{Representation, ACCEPT_ACTIVITY_JSON};
use crate::config::{FetcherConfig, UserAgentConfig};
use crate::url::is_fetchable_uri;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Transport-level failures while dereferencing a node
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// Dereferences a node identifier into its representation
///
/// `Ok(None)` means the node could not be retrieved in a usable form (gone,
/// forbidden, not JSON). `Err` is reserved for unexpected transport failures.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(
        &self,
        uri: &str,
        force_refresh: bool,
    ) -> Result<Option<Representation>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use sumi_threads::config::{FetcherConfig, UserAgentConfig};
/// use sumi_threads::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiThreads".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, &FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetcher: &FetcherConfig,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(fetcher.timeout_secs))
        .connect_timeout(Duration::from_secs(fetcher.timeout_secs.min(10)))
        .redirect(Policy::limited(5))
        .https_only(fetcher.https_only)
        .gzip(true)
        .brotli(true)
        .build()
}

/// `RemoteFetcher` backed by reqwest
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        fetcher: &FetcherConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, fetcher)?))
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(
        &self,
        uri: &str,
        force_refresh: bool,
    ) -> Result<Option<Representation>, FetchError> {
        if !is_fetchable_uri(uri) {
            tracing::debug!("Not dereferencing non-HTTP identifier {}", uri);
            return Ok(None);
        }

        let mut request = self.client.get(uri).header(ACCEPT, ACCEPT_ACTIVITY_JSON);
        if force_refresh {
            request = request.header(CACHE_CONTROL, "no-cache");
        }

        let response = request.send().await.map_err(|e| classify(uri, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Fetching {} returned HTTP {}", uri, status.as_u16());
            return Ok(None);
        }

        let body = response.text().await.map_err(|e| classify(uri, e))?;
        let representation = Representation::from_json(&body);
        if representation.is_none() {
            tracing::debug!("Response from {} is not a JSON object", uri);
        }

        Ok(representation)
    }
}

fn classify(uri: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: uri.to_string(),
        }
    } else {
        FetchError::Http {
            url: uri.to_string(),
            source: error,
        }
    }
}
