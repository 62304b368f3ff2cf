//! Template metadata consumed by field resolvers.
//!
//! Loading form schemas belongs to the administration layer; the engine only
//! needs to know, per template, which properties exist and which field type
//! resolves each of them. A [`MetadataRegistry`] maps template keys to
//! [`TemplateMetadata`]. Extension groups (`excerpt`, `seo`, ...) use the key
//! `extension:{group}`; block types are described inline on the block
//! property.
//!
//! ```rust
//! use content_resolver::metadata::{MetadataRegistry, PropertyMetadata, TemplateMetadata};
//!
//! let mut registry = MetadataRegistry::new();
//! registry.register(TemplateMetadata::new(
//!     "default",
//!     vec![
//!         PropertyMetadata::new("title", "text_line"),
//!         PropertyMetadata::new("images", "media_selection"),
//!     ],
//! ));
//!
//! assert_eq!(registry.template("default").unwrap().properties.len(), 2);
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::constants::EXTENSION_METADATA_PREFIX;

/// Description of one template property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    /// Property name, the key in the stored template data.
    pub name: String,
    /// Field type, the key of the field resolver.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Resolver parameters (e.g. requested properties of referenced pages).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    /// Block types of a block property, keyed by block type name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, Vec<PropertyMetadata>>,
}

impl PropertyMetadata {
    /// Property `name` resolved by the `field_type` resolver.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            params: Map::new(),
            types: BTreeMap::new(),
        }
    }

    /// Set one resolver parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Describe one block type.
    #[must_use]
    pub fn with_block_type(mut self, name: impl Into<String>, properties: Vec<PropertyMetadata>) -> Self {
        self.types.insert(name.into(), properties);
        self
    }

    /// String parameter, if set.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Integer parameter, if set.
    pub fn param_i64(&self, name: &str) -> Option<i64> {
        self.params.get(name).and_then(Value::as_i64)
    }
}

/// Properties of one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    /// Template key.
    pub key: String,
    /// Properties in display order.
    pub properties: Vec<PropertyMetadata>,
}

impl TemplateMetadata {
    /// Template `key` with `properties`.
    pub fn new(key: impl Into<String>, properties: Vec<PropertyMetadata>) -> Self {
        Self {
            key: key.into(),
            properties,
        }
    }

    /// Property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties.iter().find(|property| property.name == name)
    }
}

/// Lookup of template metadata by key.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    templates: HashMap<String, TemplateMetadata>,
}

impl MetadataRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object mapping keys to property lists.
    ///
    /// ```json
    /// { "default": [{ "name": "title", "type": "text_line" }] }
    /// ```
    pub fn from_json(value: &Value) -> Result<Self> {
        let templates: BTreeMap<String, Vec<PropertyMetadata>> =
            serde_json::from_value(value.clone()).context("Failed to parse template metadata")?;

        let mut registry = Self::new();
        for (key, properties) in templates {
            registry.register(TemplateMetadata::new(key, properties));
        }
        Ok(registry)
    }

    /// Add or replace a template.
    pub fn register(&mut self, template: TemplateMetadata) {
        self.templates.insert(template.key.clone(), template);
    }

    /// Template by key.
    pub fn template(&self, key: &str) -> Option<&TemplateMetadata> {
        self.templates.get(key)
    }

    /// Metadata of an extension group (`extension:{group}`).
    pub fn extension(&self, group: &str) -> Option<&TemplateMetadata> {
        self.templates.get(&format!("{EXTENSION_METADATA_PREFIX}{group}"))
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no template is registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
