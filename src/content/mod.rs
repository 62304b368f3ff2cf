//! Content trees, content views and resolvable tokens.
//!
//! A field resolver turns one stored field into a [`ContentView`]: the
//! content value paired with a view sidecar of metadata. Content is a tree
//! that, besides plain JSON, may hold nested views and [`Resolvable`]
//! placeholders:
//!
//! ```rust
//! use content_resolver::content::{Content, ContentView, ResourceToken};
//! use serde_json::json;
//!
//! let images = ContentView::new(
//!     Content::List(vec![
//!         ResourceToken::new("1", "media").into(),
//!         ResourceToken::new("2", "media").into(),
//!     ]),
//!     json!({"ids": ["1", "2"]}),
//! );
//! assert!(images.content().contains_resolvables());
//! ```

mod path;
mod resolvable;

pub use path::{ContentPath, PathSegment};
pub use resolvable::{
    PostProcess, Resolvable, ResourceToken, SmartToken, metadata_identifier,
};

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Map of named content nodes.
pub type ContentMap = BTreeMap<String, Content>;

/// One node of a content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Absent value.
    Null,
    /// Plain JSON leaf; never holds views or tokens.
    Value(Value),
    /// Ordered children.
    List(Vec<Content>),
    /// Named children.
    Map(ContentMap),
    /// Nested content view, flattened by the engine.
    View(Box<ContentView>),
    /// Placeholder awaiting a batch load.
    ///
    /// `depth` is stamped by the flattener when the token is queued.
    Resolvable {
        /// The token.
        resolvable: Resolvable,
        /// Depth at which the token was discovered.
        depth: usize,
    },
}

impl Content {
    /// Wrap a token at depth 0; the flattener assigns the real depth.
    pub fn resolvable(resolvable: impl Into<Resolvable>) -> Self {
        Self::Resolvable {
            resolvable: resolvable.into(),
            depth: 0,
        }
    }

    /// Whether the node is [`Content::Null`] or a JSON `null` leaf.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Value(Value::Null))
    }

    /// Whether the node is a nested content view.
    pub fn is_view(&self) -> bool {
        matches!(self, Self::View(_))
    }

    /// Children of a list or map, in order, with their keys.
    ///
    /// Returns `None` for leaves, views and tokens.
    pub fn entries(&self) -> Option<Vec<(PathSegment, &Content)>> {
        match self {
            Self::List(items) => Some(
                items.iter().enumerate().map(|(index, item)| (PathSegment::Index(index), item)).collect(),
            ),
            Self::Map(map) => {
                Some(map.iter().map(|(key, item)| (PathSegment::Key(key.clone()), item)).collect())
            }
            _ => None,
        }
    }

    /// Whether any node below (or at) this one is a content view.
    pub fn contains_views(&self) -> bool {
        match self {
            Self::View(_) => true,
            Self::List(items) => items.iter().any(Self::contains_views),
            Self::Map(map) => map.values().any(Self::contains_views),
            _ => false,
        }
    }

    /// Whether any node below (or at) this one is a resolvable token,
    /// including tokens inside nested views.
    pub fn contains_resolvables(&self) -> bool {
        match self {
            Self::Resolvable {
                ..
            } => true,
            Self::View(view) => view.content.contains_resolvables(),
            Self::List(items) => items.iter().any(Self::contains_resolvables),
            Self::Map(map) => map.values().any(Self::contains_resolvables),
            _ => false,
        }
    }

    /// Convert into plain JSON. Remaining tokens become `null`, nested views
    /// contribute their content only.
    pub fn into_json(self) -> Value {
        match self {
            Self::Null
            | Self::Resolvable {
                ..
            } => Value::Null,
            Self::Value(value) => value,
            Self::List(items) => Value::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Map(map) => Value::Object(
                map.into_iter().map(|(key, item)| (key, item.into_json())).collect::<Map<_, _>>(),
            ),
            Self::View(view) => view.content.into_json(),
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::Null
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        if value.is_null() {
            Self::Null
        } else {
            Self::Value(value)
        }
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<Vec<Content>> for Content {
    fn from(items: Vec<Content>) -> Self {
        Self::List(items)
    }
}

impl From<ContentMap> for Content {
    fn from(map: ContentMap) -> Self {
        Self::Map(map)
    }
}

impl From<ContentView> for Content {
    fn from(view: ContentView) -> Self {
        Self::View(Box::new(view))
    }
}

impl From<Resolvable> for Content {
    fn from(resolvable: Resolvable) -> Self {
        Self::resolvable(resolvable)
    }
}

impl From<ResourceToken> for Content {
    fn from(token: ResourceToken) -> Self {
        Self::resolvable(token)
    }
}

impl From<SmartToken> for Content {
    fn from(token: SmartToken) -> Self {
        Self::resolvable(token)
    }
}

/// A content value paired with its view sidecar.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentView {
    content: Content,
    view: Value,
}

impl ContentView {
    /// Pair `content` with `view`. A non-object view is wrapped as `{"value": view}`.
    pub fn new(content: impl Into<Content>, view: Value) -> Self {
        let view = match view {
            Value::Object(_) => view,
            Value::Null => Value::Object(Map::new()),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Value::Object(map)
            }
        };

        Self {
            content: content.into(),
            view,
        }
    }

    /// Content with an empty view.
    pub fn content_only(content: impl Into<Content>) -> Self {
        Self::new(content, Value::Object(Map::new()))
    }

    /// A map of named sub-views, as produced for a group of fields.
    pub fn group(fields: BTreeMap<String, ContentView>) -> Self {
        let content: ContentMap =
            fields.into_iter().map(|(name, view)| (name, Content::from(view))).collect();
        Self::content_only(Content::Map(content))
    }

    /// The content value.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// The view sidecar (always a JSON object).
    pub fn view(&self) -> &Value {
        &self.view
    }

    /// Split into content and view.
    pub fn into_parts(self) -> (Content, Value) {
        (self.content, self.view)
    }
}
