//! Positions inside content and view trees.

use serde_json::{Map, Value};
use std::fmt;

/// One step of a [`ContentPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Map key.
    Key(String),
    /// List index.
    Index(usize),
}

impl PathSegment {
    /// The segment as an object key (indices become their decimal form).
    pub fn as_key(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(index) => index.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{}", key.replace('~', "~0").replace('/', "~1")),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Position of a node, from the root of a flattened tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentPath {
    segments: Vec<PathSegment>,
}

impl ContentPath {
    /// The root position.
    pub fn root() -> Self {
        Self::default()
    }

    /// This path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            segments,
        }
    }

    /// This path extended by a map key.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        self.child(PathSegment::Key(key.to_string()))
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path with its first segment removed, if it starts with `key`.
    pub fn strip_key(&self, key: &str) -> Option<Self> {
        match self.segments.first() {
            Some(PathSegment::Key(first)) if first == key => Some(Self {
                segments: self.segments[1..].to_vec(),
            }),
            _ => None,
        }
    }

    /// JSON pointer (RFC 6901) of this path below `prefix`.
    pub fn to_pointer(&self, prefix: &str) -> String {
        let mut pointer = prefix.to_string();
        for segment in &self.segments {
            pointer.push('/');
            pointer.push_str(&segment.to_string());
        }
        pointer
    }

    /// Insert `value` at this path in `root` unless data is already there.
    ///
    /// Missing intermediate nodes are created as objects; list indices on
    /// existing arrays are honored. Returns whether the value was written.
    pub fn insert_if_vacant(&self, root: &mut Value, value: Value) -> bool {
        let Some((last, parents)) = self.segments.split_last() else {
            if is_vacant(root) {
                *root = value;
                return true;
            }
            return false;
        };

        let mut current = root;
        for segment in parents {
            current = match descend(current, segment) {
                Some(next) => next,
                None => return false,
            };
        }

        match (current, last) {
            (Value::Array(items), PathSegment::Index(index)) => {
                if *index >= items.len() {
                    items.resize(index + 1, Value::Null);
                }
                if is_vacant(&items[*index]) {
                    items[*index] = value;
                    true
                } else {
                    false
                }
            }
            (current, segment) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                let Value::Object(map) = current else {
                    return false;
                };
                let slot = map.entry(segment.as_key()).or_insert(Value::Null);
                if is_vacant(slot) {
                    *slot = value;
                    true
                } else {
                    false
                }
            }
        }
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_pointer(""))
    }
}

fn is_vacant(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn descend<'a>(current: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    if current.is_null() {
        *current = Value::Object(Map::new());
    }

    match (current, segment) {
        (Value::Array(items), PathSegment::Index(index)) => {
            if *index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            items.get_mut(*index)
        }
        (Value::Object(map), segment) => {
            Some(map.entry(segment.as_key()).or_insert_with(|| Value::Object(Map::new())))
        }
        _ => None,
    }
}
