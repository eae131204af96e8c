use crate::state::VisitedSet;

/// Discovered-but-not-yet-expanded node identifiers for one crawl run
///
/// Expansion order is LIFO: the most recently discovered reply is expanded
/// first, so a crawl that hits the cap truncates the oldest pending branches.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    pending: Vec<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues every identifier of `batch` that `visited` has not seen yet
    ///
    /// Each survivor is inserted into `visited` and pushed here in the same
    /// step, which also drops duplicates inside the batch. Returns the number
    /// of identifiers queued.
    pub fn extend_unvisited<I, S>(&mut self, batch: I, visited: &mut VisitedSet) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for uri in batch {
            let uri = uri.as_ref();
            if visited.insert(uri) {
                self.pending.push(uri.to_string());
                added += 1;
            }
        }
        added
    }

    /// Removes the most recently queued identifier
    pub fn pop(&mut self) -> Option<String> {
        self.pending.pop()
    }

    /// Number of identifiers waiting for expansion
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is waiting for expansion
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
