use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Options attached to a crawl job
///
/// Forwarded verbatim (cloned) to every collection expansion and to every
/// reply fetch job those expansions dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlOptions {
    /// Correlates log lines and follow-up jobs with the originating request
    #[serde(default, rename = "request-id", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Any further options, passed through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CrawlOptions {
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
            ..Self::default()
        }
    }
}
