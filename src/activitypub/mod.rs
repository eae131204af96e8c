//! ActivityPub data types used by the crawler
//!
//! This module provides:
//! - `Representation`: a fetched JSON object snapshot of a remote node
//! - `RepliesPointer`: the tagged form of a node's `replies` field
//! - `CollectionPage`: a read-only view over a (paged) collection
//! - `CrawlOptions`: job options forwarded verbatim to every expansion

mod collection;
mod options;
mod representation;

pub use collection::CollectionPage;
pub use options::CrawlOptions;
pub use representation::{RepliesPointer, Representation};

/// Media types sent in the `Accept` header when dereferencing nodes
pub const ACCEPT_ACTIVITY_JSON: &str =
    "application/activity+json, application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"";
