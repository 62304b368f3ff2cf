//! Field resolvers and their registry.
//!
//! Each template property is resolved by the [`FieldResolver`] registered
//! for its field type. A resolver receives the raw stored value and returns
//! a [`ContentView`] whose content may hold [`Resolvable`] tokens or nested
//! views; it never loads anything itself.
//!
//! [`FieldResolverRegistry::resolve`] produces one named [`ContentView`] per
//! group of a snapshot:
//!
//! - `template` - the template fields, resolved through template metadata
//! - one entry per extension trait (`excerpt`, `seo`, ...)
//! - `settings` - dimension settings (template key, locales, author data)
//!
//! [`Resolvable`]: crate::content::Resolvable

mod block;
mod default;
mod selection;
mod smart_content;

pub use block::BlockFieldResolver;
pub use default::DefaultFieldResolver;
pub use selection::{SelectionFieldResolver, SingleSelectionFieldResolver};
pub use smart_content::SmartContentFieldResolver;

use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::constants::{SETTINGS_GROUP, TEMPLATE_GROUP};
use crate::content::ContentView;
use crate::dimension::ContentSnapshot;
use crate::metadata::{MetadataRegistry, PropertyMetadata};

/// Per-call data available to field resolvers.
pub struct FieldContext<'a> {
    /// Locale of the resolution.
    pub locale: Option<&'a str>,
    /// Registry, for resolvers that resolve nested properties.
    pub registry: &'a FieldResolverRegistry,
}

/// Converts one raw field value into a [`ContentView`].
pub trait FieldResolver: Send + Sync {
    /// Resolve `raw`, the stored value of `property` (`null` when absent).
    ///
    /// Empty input must still produce a view whose sidecar reflects the
    /// "no selection" shape.
    fn resolve(&self, raw: &Value, property: &PropertyMetadata, context: &FieldContext<'_>) -> ContentView;
}

/// Field resolvers keyed by field type.
pub struct FieldResolverRegistry {
    resolvers: HashMap<String, Arc<dyn FieldResolver>>,
    metadata: MetadataRegistry,
}

impl FieldResolverRegistry {
    /// Empty registry using `metadata` for template lookups.
    pub fn new(metadata: MetadataRegistry) -> Self {
        Self {
            resolvers: HashMap::new(),
            metadata,
        }
    }

    /// Registry with the built-in field types registered.
    pub fn with_defaults(metadata: MetadataRegistry) -> Self {
        let mut registry = Self::new(metadata);

        for field_type in [
            "text_line",
            "text_area",
            "text_editor",
            "checkbox",
            "number",
            "color",
            "date",
            "time",
            "email",
            "phone",
            "url",
            "select",
            "single_select",
        ] {
            registry.register(field_type, DefaultFieldResolver);
        }

        for (field_type, loader_key) in [
            ("page_selection", "page"),
            ("media_selection", "media"),
            ("category_selection", "category"),
            ("tag_selection", "tag"),
            ("snippet_selection", "snippet"),
        ] {
            registry.register(field_type, SelectionFieldResolver::new(loader_key));
        }

        for (field_type, loader_key) in [
            ("single_page_selection", "page"),
            ("single_media_selection", "media"),
            ("single_category_selection", "category"),
            ("single_snippet_selection", "snippet"),
        ] {
            registry.register(field_type, SingleSelectionFieldResolver::new(loader_key));
        }

        registry.register("block", BlockFieldResolver);
        registry.register("smart_content", SmartContentFieldResolver::new("page"));

        registry
    }

    /// Register (or replace) the resolver for `field_type`.
    pub fn register(&mut self, field_type: impl Into<String>, resolver: impl FieldResolver + 'static) {
        self.register_shared(field_type, Arc::new(resolver));
    }

    /// Register a resolver that is shared with other registries.
    pub fn register_shared(&mut self, field_type: impl Into<String>, resolver: Arc<dyn FieldResolver>) {
        self.resolvers.insert(field_type.into(), resolver);
    }

    /// Resolver for `field_type`.
    pub fn get(&self, field_type: &str) -> Option<&Arc<dyn FieldResolver>> {
        self.resolvers.get(field_type)
    }

    /// Template metadata used by this registry.
    pub fn metadata(&self) -> &MetadataRegistry {
        &self.metadata
    }

    /// Resolve every group of `snapshot` into named content views.
    ///
    /// `properties` restricts the resolved fields: plain names select
    /// template fields, `group.name` selects extension fields. Groups left
    /// without any selected field are omitted; `settings` is always present.
    pub fn resolve(
        &self,
        snapshot: &ContentSnapshot,
        properties: Option<&[String]>,
    ) -> BTreeMap<String, ContentView> {
        let locale = snapshot.effective_locale();
        let mut groups = BTreeMap::new();

        let template_properties = snapshot
            .template_key
            .as_deref()
            .and_then(|key| self.metadata.template(key))
            .map(|template| template.properties.as_slice());
        let template_fields = self.resolve_group(
            &snapshot.template_data,
            template_properties,
            selection(properties, None),
            locale,
        );
        if properties.is_none() || !template_fields.is_empty() {
            groups.insert(TEMPLATE_GROUP.to_string(), ContentView::group(template_fields));
        }

        for (group, data) in &snapshot.extensions {
            let group_properties =
                self.metadata.extension(group).map(|template| template.properties.as_slice());
            let fields = self.resolve_group(
                data,
                group_properties,
                selection(properties, Some(group)),
                locale,
            );
            if !fields.is_empty() {
                groups.insert(group.clone(), ContentView::group(fields));
            }
        }

        groups.insert(SETTINGS_GROUP.to_string(), settings_view(snapshot));
        groups
    }

    /// Resolve `data` through property metadata.
    ///
    /// Properties whose field type has no resolver are skipped. A missing
    /// value is resolved as `null`.
    pub fn resolve_properties(
        &self,
        data: &Map<String, Value>,
        properties: &[PropertyMetadata],
        locale: Option<&str>,
    ) -> BTreeMap<String, ContentView> {
        let context = FieldContext {
            locale,
            registry: self,
        };

        let mut views = BTreeMap::new();
        for property in properties {
            let Some(resolver) = self.get(&property.field_type) else {
                tracing::debug!(
                    "No field resolver for type '{}', skipping '{}'",
                    property.field_type,
                    property.name
                );
                continue;
            };

            let raw = data.get(&property.name).unwrap_or(&Value::Null);
            views.insert(property.name.clone(), resolver.resolve(raw, property, &context));
        }
        views
    }

    fn resolve_group(
        &self,
        data: &Map<String, Value>,
        properties: Option<&[PropertyMetadata]>,
        selected: Option<Vec<&str>>,
        locale: Option<&str>,
    ) -> BTreeMap<String, ContentView> {
        let is_selected =
            |name: &str| selected.as_ref().is_none_or(|names| names.contains(&name));

        match properties {
            Some(properties) => {
                let properties: Vec<PropertyMetadata> = properties
                    .iter()
                    .filter(|property| is_selected(&property.name))
                    .cloned()
                    .collect();
                self.resolve_properties(data, &properties, locale)
            }
            // Without metadata, stored fields pass through unresolved.
            None => data
                .iter()
                .filter(|(name, _)| is_selected(name))
                .map(|(name, value)| (name.clone(), DefaultFieldResolver::view_of(value)))
                .collect(),
        }
    }
}

/// Names selected for `group` (`None` = template group), or `None` for "all".
fn selection<'a>(properties: Option<&'a [String]>, group: Option<&str>) -> Option<Vec<&'a str>> {
    let properties = properties?;
    Some(
        properties
            .iter()
            .filter_map(|property| match (property.split_once('.'), group) {
                (None, None) => Some(property.as_str()),
                (Some((prefix, name)), Some(group)) if prefix == group => Some(name),
                _ => None,
            })
            .collect(),
    )
}

fn settings_view(snapshot: &ContentSnapshot) -> ContentView {
    let settings = [
        ("template_key", json!(snapshot.template_key)),
        ("locale", json!(snapshot.locale)),
        ("stage", json!(snapshot.stage)),
        ("version", json!(snapshot.version)),
        ("available_locales", json!(snapshot.available_locales)),
        ("ghost_locale", json!(snapshot.ghost_locale)),
        ("authored", json!(snapshot.authored)),
    ];

    ContentView::group(
        settings
            .into_iter()
            .map(|(name, value)| (name.to_string(), DefaultFieldResolver::view_of(&value)))
            .collect(),
    )
}
