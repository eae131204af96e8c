//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitedSet`: identifiers already enqueued during one crawl run
//! - `Frontier`: identifiers discovered but not yet expanded

mod frontier;
mod visited;

pub use frontier::Frontier;
pub use visited::VisitedSet;
