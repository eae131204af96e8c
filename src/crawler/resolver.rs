//! Replies pointer lookup
//!
//! Decides, node by node, whether a reply has its own replies collection.

use crate::activitypub::{RepliesPointer, Representation};
use crate::crawler::{FetchError, RemoteFetcher};
use crate::ThreadsError;

/// Outcome of looking up a node's replies collection
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The node points at a replies collection
    Found(RepliesPointer),

    /// The node has no replies field
    Leaf,

    /// The node could not be fetched; its branch contributes nothing
    Unavailable,
}

/// Extracts replies pointers for one crawl run
///
/// Fetch failures degrade to `Resolution::Unavailable`, except for the run's
/// root: without it nothing can make progress, so its failure is returned as
/// an error.
pub struct CollectionResolver<'a> {
    fetcher: &'a dyn RemoteFetcher,
    root_uri: &'a str,
}

impl<'a> CollectionResolver<'a> {
    pub fn new(fetcher: &'a dyn RemoteFetcher, root_uri: &'a str) -> Self {
        Self { fetcher, root_uri }
    }

    /// Finds the replies pointer of `node_uri`
    ///
    /// Uses `representation` when given, otherwise fetches the node.
    pub async fn replies_pointer(
        &self,
        node_uri: &str,
        representation: Option<&Representation>,
    ) -> Result<Resolution, ThreadsError> {
        let fetched;
        let representation = match representation {
            Some(representation) => representation,
            None => match self.fetcher.fetch(node_uri, false).await {
                Ok(Some(representation)) => {
                    fetched = representation;
                    &fetched
                }
                Ok(None) => return self.unavailable(node_uri, None),
                Err(e) => return self.unavailable(node_uri, Some(e)),
            },
        };

        Ok(match representation.replies() {
            Some(pointer) => Resolution::Found(pointer),
            None => Resolution::Leaf,
        })
    }

    fn unavailable(
        &self,
        node_uri: &str,
        error: Option<FetchError>,
    ) -> Result<Resolution, ThreadsError> {
        if node_uri == self.root_uri {
            return Err(match error {
                Some(e) => ThreadsError::Fetch(e),
                None => ThreadsError::RootUnavailable {
                    uri: node_uri.to_string(),
                },
            });
        }

        match error {
            Some(e) => tracing::warn!("Failed to fetch {}: {}", node_uri, e),
            None => tracing::warn!("Could not retrieve {}", node_uri),
        }

        Ok(Resolution::Unavailable)
    }
}
