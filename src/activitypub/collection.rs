use crate::activitypub::{RepliesPointer, Representation};
use serde_json::Value;

/// Read-only view over a collection or collection page
pub struct CollectionPage<'a> {
    inner: &'a Representation,
}

impl<'a> CollectionPage<'a> {
    pub fn new(inner: &'a Representation) -> Self {
        Self { inner }
    }

    /// Item identifiers on this page, in document order
    ///
    /// Unordered collections carry `items`, ordered ones `orderedItems`; when
    /// the type is missing or unknown either field is accepted. Items may be
    /// bare identifiers or objects carrying an `id`; anything else is skipped.
    pub fn item_ids(&self) -> Vec<String> {
        let items = match self.inner.kind() {
            Some("Collection") | Some("CollectionPage") => self.inner.get("items"),
            Some("OrderedCollection") | Some("OrderedCollectionPage") => {
                self.inner.get("orderedItems")
            }
            _ => self
                .inner
                .get("orderedItems")
                .or_else(|| self.inner.get("items")),
        };

        match items {
            Some(Value::Array(values)) => values.iter().filter_map(value_or_id).collect(),
            Some(single) => value_or_id(single).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Link to the first page, if this is a paged collection
    pub fn first(&self) -> Option<RepliesPointer> {
        self.link("first")
    }

    /// Link to the following page
    pub fn next(&self) -> Option<RepliesPointer> {
        self.link("next")
    }

    fn link(&self, key: &str) -> Option<RepliesPointer> {
        match self.inner.get(key).and_then(RepliesPointer::from_value) {
            Some(RepliesPointer::Reference(uri)) if uri.is_empty() => None,
            Some(RepliesPointer::Unrecognized(_)) => None,
            link => link,
        }
    }
}

fn value_or_id(value: &Value) -> Option<String> {
    match value {
        Value::String(uri) => Some(uri.clone()),
        Value::Object(map) => map.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
