//! JSON fixtures backing the preview command.
//!
//! A fixture replaces the persistence layer and every backend loader:
//!
//! ```json
//! {
//!   "rows": [
//!     { "resource": { "resource_key": "pages", "id": "1" }, "stage": "live",
//!       "template_key": "default", "template_data": { "title": "Home", "image": 7 } }
//!   ],
//!   "templates": { "default": [
//!     { "name": "title", "type": "text_line" },
//!     { "name": "image", "type": "single_media_selection" }
//!   ] },
//!   "resources": { "media": { "7": { "url": "/logo.png" } } },
//!   "smart": { "page": ["2", "3", { "title": "Inline" }] }
//! }
//! ```
//!
//! `resources` feeds one [`StaticLoader`] per loader key. `smart` feeds one
//! [`StaticSmartResolver`] per loader key: string and number entries become
//! references to the resource loader of the same key, object entries are
//! returned as they are.

use anyhow::{Context, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::content::{Content, ContentView, ResourceToken, SmartToken};
use crate::core::ResolveError;
use crate::dimension::DimensionRow;
use crate::fields::FieldResolverRegistry;
use crate::metadata::MetadataRegistry;
use crate::resolver::{LoaderRegistry, ResourceLoader, SmartResolver};

/// Parsed preview fixture.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    /// Dimension rows of every entity in the fixture.
    pub rows: Vec<DimensionRow>,
    /// Template metadata, as accepted by [`MetadataRegistry::from_json`].
    #[serde(default)]
    pub templates: Value,
    /// Raw values by loader key and id.
    #[serde(default)]
    pub resources: BTreeMap<String, HashMap<String, Value>>,
    /// Smart query results by loader key.
    #[serde(default)]
    pub smart: BTreeMap<String, Vec<Value>>,
}

impl Fixture {
    /// Parse a fixture from JSON text. `path` is used in errors only.
    pub fn from_json(content: &str, path: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|error| {
            ResolveError::FixtureError {
                path: path.to_string(),
                reason: error.to_string(),
            }
            .into()
        })
    }

    /// Read and parse a fixture file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fixture from {}", path.display()))?;
        Self::from_json(&content, &path.display().to_string())
    }

    /// Rows of the resource with `id`, optionally restricted to `resource_key`.
    pub fn rows_for(&self, id: &str, resource_key: Option<&str>) -> Vec<DimensionRow> {
        self.rows
            .iter()
            .filter(|row| row.resource.id == id)
            .filter(|row| resource_key.is_none_or(|key| row.resource.resource_key == key))
            .cloned()
            .collect()
    }

    /// Template metadata of the fixture.
    pub fn metadata(&self) -> Result<MetadataRegistry> {
        if self.templates.is_null() {
            return Ok(MetadataRegistry::new());
        }
        MetadataRegistry::from_json(&self.templates)
    }

    /// Field resolver registry with the built-in field types.
    pub fn field_registry(&self) -> Result<FieldResolverRegistry> {
        Ok(FieldResolverRegistry::with_defaults(self.metadata()?))
    }

    /// Loaders and smart resolvers serving the fixture data.
    pub fn loader_registry(&self) -> LoaderRegistry {
        let mut registry = LoaderRegistry::new();
        for (loader_key, values) in &self.resources {
            registry.register_loader(loader_key.clone(), Arc::new(StaticLoader::new(values.clone())));
        }
        for (loader_key, results) in &self.smart {
            registry.register_smart_resolver(
                loader_key.clone(),
                Arc::new(StaticSmartResolver::new(results.clone())),
            );
        }
        registry
    }
}

/// Resource loader answering from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    values: HashMap<String, Value>,
}

impl StaticLoader {
    /// Loader serving `values` by id.
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self {
            values,
        }
    }
}

impl ResourceLoader for StaticLoader {
    fn load<'a>(
        &'a self,
        ids: &'a [String],
        _locale: Option<&'a str>,
        params: &'a Value,
    ) -> BoxFuture<'a, Result<HashMap<String, Value>>> {
        async move {
            let wanted: Option<Vec<&str>> = params
                .get("properties")
                .and_then(Value::as_array)
                .map(|keys| keys.iter().filter_map(Value::as_str).collect());

            Ok(ids
                .iter()
                .filter_map(|id| {
                    let value = self.values.get(id)?;
                    Some((id.clone(), select_properties(value, wanted.as_deref())))
                })
                .collect())
        }
        .boxed()
    }
}

fn select_properties(value: &Value, wanted: Option<&[&str]>) -> Value {
    match (value, wanted) {
        (Value::Object(object), Some(wanted)) => Value::Object(
            object
                .iter()
                .filter(|(key, _)| wanted.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Smart resolver answering every query from a fixed result list.
///
/// Honors a numeric `limit` parameter. String and number entries become
/// [`ResourceToken`]s for the token's own loader key; objects are returned
/// as plain values. The view reports `total` and `limit`.
#[derive(Debug, Clone, Default)]
pub struct StaticSmartResolver {
    results: Vec<Value>,
}

impl StaticSmartResolver {
    /// Resolver returning `results` for every query.
    pub fn new(results: Vec<Value>) -> Self {
        Self {
            results,
        }
    }
}

impl SmartResolver for StaticSmartResolver {
    fn resolve<'a>(&'a self, token: &'a SmartToken, _locale: Option<&'a str>) -> BoxFuture<'a, Result<ContentView>> {
        async move {
            let limit = token
                .parameters()
                .get("limit")
                .and_then(Value::as_u64)
                .and_then(|limit| usize::try_from(limit).ok());

            let items: Vec<Content> = self
                .results
                .iter()
                .take(limit.unwrap_or(usize::MAX))
                .map(|result| match result {
                    Value::String(id) => Content::from(ResourceToken::new(id.clone(), token.loader_key())),
                    Value::Number(id) => Content::from(ResourceToken::new(id.to_string(), token.loader_key())),
                    other => Content::from(other.clone()),
                })
                .collect();

            let view = json!({ "total": items.len(), "limit": limit });
            Ok(ContentView::new(Content::List(items), view))
        }
        .boxed()
    }
}
