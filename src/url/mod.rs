//! URL handling for node identifiers
//!
//! Node identifiers are opaque strings: the crawler never rewrites them, since
//! two spellings of the same URI must stay distinct for dedup to be exact. This
//! module only decides whether an identifier is something we can dereference,
//! and extracts hosts for reporting.

use url::Url;

/// Parses an identifier as an absolute HTTP(S) URL with a host
///
/// # Examples
///
/// ```
/// use sumi_threads::url::parse_node_uri;
///
/// assert!(parse_node_uri("https://example.com/users/a/statuses/1").is_some());
/// assert!(parse_node_uri("urn:uuid:1234").is_none());
/// assert!(parse_node_uri("/relative/path").is_none());
/// ```
pub fn parse_node_uri(uri: &str) -> Option<Url> {
    let url = Url::parse(uri).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str()?;
    Some(url)
}

/// Returns true if the identifier can be fetched over HTTP(S)
pub fn is_fetchable_uri(uri: &str) -> bool {
    parse_node_uri(uri).is_some()
}

/// Extracts the lowercase host from a URL
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the lowercase host from an identifier string
pub fn host_of(uri: &str) -> Option<String> {
    parse_node_uri(uri).as_ref().and_then(extract_domain)
}
