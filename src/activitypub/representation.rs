use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A fetched structural snapshot of a remote node
///
/// Always a JSON object. Nothing beyond the fields the crawler reads is
/// interpreted or validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Representation(Map<String, Value>);

impl Representation {
    /// Wraps a JSON value, returning None unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Parses a JSON document, returning None unless it is an object
    pub fn from_json(body: &str) -> Option<Self> {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(Self::from_value)
    }

    /// The node's `id`, if present
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// The node's `type`, if present
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Raw access to a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Extracts the replies pointer
    ///
    /// A missing or `null` field means the node is a leaf.
    pub fn replies(&self) -> Option<RepliesPointer> {
        self.0.get("replies").and_then(RepliesPointer::from_value)
    }

    /// Serializes back to a JSON string
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

/// Reference to a replies collection, as found on a node
#[derive(Debug, Clone, PartialEq)]
pub enum RepliesPointer {
    /// A bare collection URI that must be dereferenced
    Reference(String),

    /// A collection embedded in the node's representation
    Inline(Representation),

    /// Any other JSON shape; resolves to nothing
    Unrecognized(Value),
}

impl RepliesPointer {
    /// Classifies a JSON value; `null` yields None
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(uri) => Some(Self::Reference(uri.clone())),
            Value::Object(map) => Some(Self::Inline(Representation(map.clone()))),
            other => Some(Self::Unrecognized(other.clone())),
        }
    }

    /// The identifier of the referenced collection, when one is known
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Reference(uri) => Some(uri.as_str()),
            Self::Inline(collection) => collection.id(),
            Self::Unrecognized(_) => None,
        }
    }
}
