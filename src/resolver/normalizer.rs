//! Conversion of a finished resolution into its output shape.
//!
//! [`splice_views`] turns the content trees into plain JSON and re-splices
//! the views of substituted values into the view trees, deepest first and
//! never over existing data. [`normalize`] then lifts the `template` group
//! into `content`/`view`, `settings` into `settings` and every remaining
//! group into `extension`.

use serde::Serialize;
use serde_json::{Map, Value};

use super::replacer::Resolution;
use crate::constants::{SETTINGS_GROUP, TEMPLATE_GROUP};
use crate::core::ResourceRef;

/// Resolved groups as plain JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedViews {
    /// Content by group.
    pub content: Map<String, Value>,
    /// View by group.
    pub view: Map<String, Value>,
    /// JSON pointers (from the group root) of positions truncated to `null`.
    pub truncated: Vec<String>,
}

/// Fully resolved content of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedContent {
    /// Entity the content belongs to.
    pub resource: ResourceRef,
    /// Template fields.
    pub content: Value,
    /// View sidecar of the template fields.
    pub view: Value,
    /// Dimension settings.
    pub settings: Value,
    /// Extension groups (`excerpt`, `seo`, ...); empty groups are omitted.
    pub extension: Map<String, Value>,
    /// JSON pointers (e.g. `/content/link/0`) of positions forced to `null`
    /// by the depth or round limit.
    pub truncated: Vec<String>,
}

/// Convert the content trees to JSON and splice view fragments back.
pub fn splice_views(resolution: Resolution) -> ResolvedViews {
    let Resolution {
        content,
        view,
        mut fragments,
        truncated,
    } = resolution;

    let mut view = Value::Object(view);
    fragments.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    for (path, fragment) in fragments {
        match fragment {
            Value::Object(fields) => {
                for (key, value) in fields {
                    if !path.key(&key).insert_if_vacant(&mut view, value) {
                        tracing::trace!("Keeping existing view at {}/{}", path, key);
                    }
                }
            }
            other => {
                path.insert_if_vacant(&mut view, other);
            }
        }
    }

    ResolvedViews {
        content: content.into_iter().map(|(key, node)| (key, node.into_json())).collect(),
        view: match view {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        truncated: truncated.iter().map(|path| path.to_pointer("")).collect(),
    }
}

/// Lift the groups of `views` into the output shape.
pub fn normalize(resource: ResourceRef, views: ResolvedViews) -> ResolvedContent {
    let ResolvedViews {
        mut content,
        mut view,
        truncated,
    } = views;

    let template = object_or_empty(content.remove(TEMPLATE_GROUP));
    let template_view = object_or_empty(view.remove(TEMPLATE_GROUP));
    let settings = object_or_empty(content.remove(SETTINGS_GROUP));

    let extension: Map<String, Value> = content
        .into_iter()
        .filter(|(_, value)| !is_empty_group(value))
        .collect();

    ResolvedContent {
        resource,
        content: template,
        view: template_view,
        settings,
        extension,
        truncated: truncated.iter().map(|pointer| output_pointer(pointer)).collect(),
    }
}

/// Map a group-rooted pointer to its position in [`ResolvedContent`].
fn output_pointer(pointer: &str) -> String {
    let rest = pointer.strip_prefix('/').unwrap_or(pointer);
    let (group, tail) = match rest.split_once('/') {
        Some((group, tail)) => (group, format!("/{tail}")),
        None => (rest, String::new()),
    };

    match group {
        TEMPLATE_GROUP => format!("/content{tail}"),
        SETTINGS_GROUP => format!("/settings{tail}"),
        _ => format!("/extension{pointer}"),
    }
}

fn object_or_empty(value: Option<Value>) -> Value {
    match value {
        Some(value @ Value::Object(_)) => value,
        _ => Value::Object(Map::new()),
    }
}

fn is_empty_group(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
