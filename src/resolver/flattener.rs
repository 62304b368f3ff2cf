//! Flattening of nested content views.
//!
//! The flattener peels every [`ContentView`] of a tree into two parallel
//! trees: a content tree (which keeps resolvable tokens in place) and a
//! JSON view tree. Every token found on the way is queued, and its depth is
//! stamped on the node at queue time.
//!
//! Fan-out rules, checked in order:
//!
//! 1. A non-empty list whose every element is a view is a homogeneous list
//!    of sub-views (repeated blocks): each element is flattened at
//!    `depth + 1` and the list shape is kept in both trees.
//! 2. Any other list or map is walked positionally: views are flattened at
//!    the same depth and merged under their key, tokens are queued at the
//!    current depth, plain values pass through.
//! 3. A single token is queued at the current depth; anything else passes
//!    through unchanged.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::queue::ResolutionQueue;
use crate::content::{Content, ContentMap, ContentView};

/// Flattened output of one or more named views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedViews {
    /// Content trees by name; tokens stay in place, views are gone.
    pub content: ContentMap,
    /// View trees by name.
    pub view: Map<String, Value>,
}

/// Flatten one named view, queueing its tokens at `depth`.
pub fn resolve_view(
    content_view: ContentView,
    name: &str,
    depth: usize,
    queue: &mut ResolutionQueue,
) -> FlattenedViews {
    let (content, view) = flatten(content_view, depth, queue);

    let mut flattened = FlattenedViews::default();
    flattened.content.insert(name.to_string(), content);
    flattened.view.insert(name.to_string(), view);
    flattened
}

/// Flatten many named views. Each view is flattened into its own queue,
/// which is then merged into `queue`.
pub fn resolve_views(
    views: BTreeMap<String, ContentView>,
    depth: usize,
    queue: &mut ResolutionQueue,
) -> FlattenedViews {
    let mut flattened = FlattenedViews::default();

    for (name, content_view) in views {
        let mut child_queue = ResolutionQueue::new();
        let partial = resolve_view(content_view, &name, depth, &mut child_queue);
        queue.absorb(child_queue);

        flattened.content.extend(partial.content);
        flattened.view.extend(partial.view);
    }

    flattened
}

/// Flatten a view into a `(content, view)` pair.
pub fn flatten(content_view: ContentView, depth: usize, queue: &mut ResolutionQueue) -> (Content, Value) {
    let (content, view) = content_view.into_parts();
    flatten_content(content, view, depth, queue)
}

fn flatten_content(
    content: Content,
    view: Value,
    depth: usize,
    queue: &mut ResolutionQueue,
) -> (Content, Value) {
    match content {
        Content::List(items) if !items.is_empty() && items.iter().all(Content::is_view) => {
            let mut contents = Vec::with_capacity(items.len());
            let mut views = Vec::with_capacity(items.len());
            for item in items {
                let (content, view) = flatten_content(item, Value::Null, depth + 1, queue);
                contents.push(content);
                views.push(view);
            }
            (Content::List(contents), Value::Array(views))
        }
        Content::View(nested) => {
            let (content, nested_view) = nested.into_parts();
            flatten_content(content, merge_views(nested_view, view), depth, queue)
        }
        Content::List(items) => {
            let mut view = into_object(view);
            let mut contents = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let key = index.to_string();
                let (content, child_view) = flatten_child(item, view.get(&key), depth, queue);
                if let Some(child_view) = child_view {
                    view.insert(key, child_view);
                }
                contents.push(content);
            }
            (Content::List(contents), Value::Object(view))
        }
        Content::Map(map) => {
            let mut view = into_object(view);
            let mut contents = ContentMap::new();
            for (key, item) in map {
                let (content, child_view) = flatten_child(item, view.get(&key), depth, queue);
                if let Some(child_view) = child_view {
                    view.insert(key.clone(), child_view);
                }
                contents.insert(key, content);
            }
            (Content::Map(contents), Value::Object(view))
        }
        Content::Resolvable {
            resolvable,
            ..
        } => {
            queue.insert(resolvable.clone(), depth);
            (
                Content::Resolvable {
                    resolvable,
                    depth,
                },
                view,
            )
        }
        plain @ (Content::Null | Content::Value(_)) => (plain, view),
    }
}

/// Flatten one element of a mixed container. Returns the element's view
/// when it contributed one.
fn flatten_child(
    item: Content,
    inherited: Option<&Value>,
    depth: usize,
    queue: &mut ResolutionQueue,
) -> (Content, Option<Value>) {
    match item {
        Content::View(_) | Content::List(_) | Content::Map(_) if item.contains_views() => {
            let inherited = inherited.cloned().unwrap_or(Value::Null);
            let (content, view) = flatten_content(item, inherited, depth, queue);
            (content, Some(view))
        }
        Content::List(_) | Content::Map(_) => {
            let (content, _) = flatten_content(item, Value::Null, depth, queue);
            (content, None)
        }
        other => {
            let (content, _) = flatten_content(other, Value::Null, depth, queue);
            (content, None)
        }
    }
}

/// Keys of `outer` that `inner` does not define are kept.
fn merge_views(inner: Value, outer: Value) -> Value {
    let mut inner = into_object(inner);
    for (key, value) in into_object(outer) {
        inner.entry(key).or_insert(value);
    }
    Value::Object(inner)
}

fn into_object(view: Value) -> Map<String, Value> {
    match view {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
