//! Integration tests for the HTTP fetcher
//!
//! These tests use wiremock to stand in for remote ActivityPub servers.

use sumi_threads::config::{FetcherConfig, UserAgentConfig};
use sumi_threads::crawler::{FetchError, HttpFetcher, RemoteFetcher};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_fetcher(timeout_secs: u64) -> HttpFetcher {
    let user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    };
    // The mock server only speaks plain HTTP
    let fetcher = FetcherConfig {
        timeout_secs,
        https_only: false,
    };
    HttpFetcher::from_config(&user_agent, &fetcher).expect("Failed to build HTTP client")
}

#[tokio::test]
async fn test_fetch_activity_json() {
    let mock_server = MockServer::start().await;
    let uri = format!("{}/notes/1", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/notes/1"))
        .and(header_exists("accept"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"{{"id": "{}", "type": "Note", "replies": "{}/replies"}}"#,
                    uri, uri
                ))
                .insert_header("content-type", "application/activity+json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let representation = create_fetcher(5)
        .fetch(&uri, false)
        .await
        .expect("Fetch failed")
        .expect("Expected a representation");

    assert_eq!(representation.id(), Some(uri.as_str()));
    assert_eq!(representation.kind(), Some("Note"));
    assert!(representation.replies().is_some());
}

#[tokio::test]
async fn test_fetch_not_found_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = create_fetcher(5)
        .fetch(&format!("{}/notes/gone", mock_server.uri()), false)
        .await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_fetch_gone_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes/deleted"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let result = create_fetcher(5)
        .fetch(&format!("{}/notes/deleted", mock_server.uri()), false)
        .await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_fetch_non_json_body_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes/html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Not ActivityStreams</body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let result = create_fetcher(5)
        .fetch(&format!("{}/notes/html", mock_server.uri()), false)
        .await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_fetch_json_array_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes/array"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
        .mount(&mock_server)
        .await;

    let result = create_fetcher(5)
        .fetch(&format!("{}/notes/array", mock_server.uri()), false)
        .await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn test_forced_fetch_bypasses_caches() {
    let mock_server = MockServer::start().await;
    let uri = format!("{}/notes/root", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/notes/root"))
        .and(header("cache-control", "no-cache"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"{{"id": "{}"}}"#, uri)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let representation = create_fetcher(5).fetch(&uri, true).await.expect("Fetch failed");

    assert!(representation.is_some());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let result = create_fetcher(1)
        .fetch(&format!("{}/notes/slow", mock_server.uri()), false)
        .await;

    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}
