use std::collections::HashSet;

/// Node identifiers already enqueued for expansion during one crawl run
///
/// The set only grows. Insertion order is kept so that reports and logs list
/// replies in the order they were discovered.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an identifier, returning true if it was not already present
    pub fn insert(&mut self, uri: &str) -> bool {
        if self.seen.contains(uri) {
            return false;
        }
        self.seen.insert(uri.to_string());
        self.order.push(uri.to_string());
        true
    }

    /// Returns true if the identifier has been visited in this run
    pub fn contains(&self, uri: &str) -> bool {
        self.seen.contains(uri)
    }

    /// Number of distinct identifiers visited
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing has been visited
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates identifiers in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
