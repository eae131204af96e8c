//! Replies collection expansion
//!
//! A `CollectionFetcher` turns a replies pointer into a finite batch of child
//! identifiers, paging through the collection as needed. Expansion never
//! fails loudly: anything that cannot be resolved yields `None` or an empty
//! batch.

use crate::activitypub::{CollectionPage, CrawlOptions, RepliesPointer, Representation};
use crate::crawler::RemoteFetcher;
use crate::jobs::{Job, JobDispatcher};
use crate::url::is_fetchable_uri;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait CollectionFetcher: Send + Sync {
    /// Resolves `pointer` into child identifiers, in discovery order
    ///
    /// `options` belongs to this call; implementations forward it unchanged
    /// to any further fetches they trigger.
    async fn expand(&self, pointer: &RepliesPointer, options: CrawlOptions)
        -> Option<Vec<String>>;
}

/// Expands ActivityPub `Collection` / `OrderedCollection` replies
///
/// Pages are followed through `first` and `next` up to `max_pages` pages per
/// call, and collection stops once `max_items` identifiers were gathered. Every
/// returned reply gets a `FetchReply` job so that it is retrieved and stored.
pub struct ActivityPubCollectionFetcher {
    fetcher: Arc<dyn RemoteFetcher>,
    dispatcher: Arc<dyn JobDispatcher>,
    max_pages: u32,
    max_items: usize,
}

impl ActivityPubCollectionFetcher {
    pub fn new(
        fetcher: Arc<dyn RemoteFetcher>,
        dispatcher: Arc<dyn JobDispatcher>,
        max_pages: u32,
        max_items: usize,
    ) -> Self {
        Self {
            fetcher,
            dispatcher,
            max_pages: max_pages.max(1),
            max_items,
        }
    }

    async fn load(&self, pointer: &RepliesPointer) -> Option<Representation> {
        match pointer {
            RepliesPointer::Inline(collection) => Some(collection.clone()),
            RepliesPointer::Reference(uri) => match self.fetcher.fetch(uri, false).await {
                Ok(Some(collection)) => Some(collection),
                Ok(None) => {
                    tracing::debug!("Collection {} could not be retrieved", uri);
                    None
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch collection {}: {}", uri, e);
                    None
                }
            },
            RepliesPointer::Unrecognized(value) => {
                tracing::debug!("Ignoring unrecognized replies value: {}", value);
                None
            }
        }
    }

    async fn collect_items(&self, pointer: &RepliesPointer) -> Option<Vec<String>> {
        let mut collection = self.load(pointer).await?;

        // Paged collections keep their items on the pages
        let first = CollectionPage::new(&collection).first();
        if let Some(first) = first {
            collection = self.load(&first).await?;
        }

        let mut items = Vec::new();
        let mut pages = 1;

        loop {
            let page = CollectionPage::new(&collection);
            items.extend(page.item_ids().into_iter().filter(|id| is_fetchable_uri(id)));

            if items.len() >= self.max_items {
                items.truncate(self.max_items);
                break;
            }

            let Some(next) = page.next() else {
                break;
            };

            if pages >= self.max_pages {
                tracing::debug!(
                    "Stopping at {} pages for {}",
                    pages,
                    pointer.uri().unwrap_or("inline collection")
                );
                break;
            }

            match self.load(&next).await {
                Some(next_page) => {
                    collection = next_page;
                    pages += 1;
                }
                None => break,
            }
        }

        Some(items)
    }
}

#[async_trait]
impl CollectionFetcher for ActivityPubCollectionFetcher {
    async fn expand(
        &self,
        pointer: &RepliesPointer,
        options: CrawlOptions,
    ) -> Option<Vec<String>> {
        let items = self.collect_items(pointer).await?;

        for uri in &items {
            let job = Job::FetchReply {
                uri: uri.clone(),
                options: options.clone(),
            };
            if let Err(e) = self.dispatcher.enqueue(job) {
                tracing::warn!("Could not enqueue fetch for {}: {}", uri, e);
            }
        }

        Some(items)
    }
}
