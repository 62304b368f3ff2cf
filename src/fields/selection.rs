//! Resolvers for fields referencing other entities by id.

use serde_json::{Map, Value, json};

use super::{FieldContext, FieldResolver};
use crate::constants::DEFAULT_RESOURCE_PRIORITY;
use crate::content::{Content, ContentView, ResourceToken};
use crate::metadata::PropertyMetadata;

/// Resolves a list of ids into one [`ResourceToken`] per id.
///
/// Accepts `[id, ...]` or `{"ids": [id, ...]}`; numeric ids are used in
/// their decimal form. The view is `{"ids": [...]}`, empty when nothing is
/// selected.
///
/// A `properties` parameter on the property restricts loaded objects to
/// the listed keys; tokens with different `properties` are loaded as
/// distinct shapes of the same id.
#[derive(Debug, Clone)]
pub struct SelectionFieldResolver {
    loader_key: String,
    priority: i32,
}

impl SelectionFieldResolver {
    /// Resolver emitting tokens for `loader_key`.
    pub fn new(loader_key: impl Into<String>) -> Self {
        Self {
            loader_key: loader_key.into(),
            priority: DEFAULT_RESOURCE_PRIORITY,
        }
    }

    /// Set the priority of emitted tokens.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl FieldResolver for SelectionFieldResolver {
    fn resolve(&self, raw: &Value, property: &PropertyMetadata, _context: &FieldContext<'_>) -> ContentView {
        let ids: Vec<String> = match raw {
            Value::Array(items) => items.iter().filter_map(id_of).collect(),
            Value::Object(map) => map
                .get("ids")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(id_of).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        let tokens = ids
            .iter()
            .map(|id| Content::from(token(id, &self.loader_key, self.priority, property)))
            .collect();

        ContentView::new(Content::List(tokens), json!({ "ids": ids }))
    }
}

/// Resolves a single id into one nullable [`ResourceToken`].
///
/// Accepts a scalar id or `{"id": id}`. The view is `{"id": id}` with a
/// `null` id when nothing is selected.
#[derive(Debug, Clone)]
pub struct SingleSelectionFieldResolver {
    loader_key: String,
    priority: i32,
}

impl SingleSelectionFieldResolver {
    /// Resolver emitting a token for `loader_key`.
    pub fn new(loader_key: impl Into<String>) -> Self {
        Self {
            loader_key: loader_key.into(),
            priority: DEFAULT_RESOURCE_PRIORITY,
        }
    }

    /// Set the priority of the emitted token.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl FieldResolver for SingleSelectionFieldResolver {
    fn resolve(&self, raw: &Value, property: &PropertyMetadata, _context: &FieldContext<'_>) -> ContentView {
        let id = match raw {
            Value::Object(map) => map.get("id").and_then(id_of),
            other => id_of(other),
        };

        match id {
            Some(id) => ContentView::new(
                token(&id, &self.loader_key, self.priority, property),
                json!({ "id": id }),
            ),
            None => ContentView::new(Content::Null, json!({ "id": null })),
        }
    }
}

fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn token(id: &str, loader_key: &str, priority: i32, property: &PropertyMetadata) -> ResourceToken {
    let token = ResourceToken::new(id, loader_key).with_priority(priority);

    let Some(Value::Array(wanted)) = property.params.get("properties") else {
        return token;
    };
    let wanted: Vec<String> = wanted.iter().filter_map(Value::as_str).map(str::to_string).collect();

    token
        .with_metadata(&json!({ "properties": wanted }))
        .with_post_process(move |raw| match raw {
            Some(Value::Object(object)) => {
                let picked: Map<String, Value> = wanted
                    .iter()
                    .filter_map(|key| object.get(key).map(|value| (key.clone(), value.clone())))
                    .collect();
                Content::from(Value::Object(picked))
            }
            Some(other) => Content::from(other.clone()),
            None => Content::Null,
        })
}
