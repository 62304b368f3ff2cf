//! Test utilities for the content resolver
//!
//! This module provides helpers shared by unit and integration tests:
//! - Logging initialization that plays well with the test harness
//! - A [`RecordingLoader`] that records every batch it is asked for
//! - A failing loader for error propagation tests
//! - Builders for dimension rows, metadata and resolvers
//!
//! # Example
//!
//! ```rust,no_run
//! use content_resolver::test_utils::{RecordingLoader, TestResolverBuilder, page_row};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let media = Arc::new(RecordingLoader::new().with_value("1", json!({"url": "/a.png"})));
//! let resolver = TestResolverBuilder::new(2, 10).with_loader("media", media.clone()).build();
//! let rows = vec![page_row("1").with_template_value("title", json!("Home"))];
//! ```

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

pub use crate::cli::{StaticLoader, StaticSmartResolver};

use crate::config::ResolverConfig;
use crate::core::ResourceRef;
use crate::dimension::{DimensionRow, Stage};
use crate::fields::{FieldResolver, FieldResolverRegistry};
use crate::metadata::{MetadataRegistry, PropertyMetadata, TemplateMetadata};
use crate::resolver::{ContentResolver, LoaderRegistry, ResourceLoader, SmartResolver};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber once, regardless of how many times it
/// is called. Uses `level` when given, else `RUST_LOG`; without either no
/// subscriber is installed.
///
/// ```bash
/// RUST_LOG=content_resolver=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Resource loader backed by a map that records every call.
///
/// Each call is recorded as the (sorted) id batch it received, which lets
/// tests assert how many backend round-trips a resolution made.
#[derive(Debug, Default)]
pub struct RecordingLoader {
    values: HashMap<String, Value>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingLoader {
    /// Loader without values; every id comes back missing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `value` for `id`.
    #[must_use]
    pub fn with_value(mut self, id: impl Into<String>, value: Value) -> Self {
        self.values.insert(id.into(), value);
        self
    }

    /// Id batches received so far, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Number of calls so far.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

impl ResourceLoader for RecordingLoader {
    fn load<'a>(
        &'a self,
        ids: &'a [String],
        _locale: Option<&'a str>,
        _params: &'a Value,
    ) -> BoxFuture<'a, Result<HashMap<String, Value>>> {
        async move {
            let mut batch = ids.to_vec();
            batch.sort();
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(batch);
            }

            Ok(ids
                .iter()
                .filter_map(|id| self.values.get(id).map(|value| (id.clone(), value.clone())))
                .collect())
        }
        .boxed()
    }
}

/// Resource loader that always fails.
#[derive(Debug, Default)]
pub struct FailingLoader;

impl ResourceLoader for FailingLoader {
    fn load<'a>(
        &'a self,
        _ids: &'a [String],
        _locale: Option<&'a str>,
        _params: &'a Value,
    ) -> BoxFuture<'a, Result<HashMap<String, Value>>> {
        async move { Err(anyhow::anyhow!("backend unavailable")) }.boxed()
    }
}

/// Unlocalized live row of `pages/{id}` using template `default`.
pub fn page_row(id: &str) -> DimensionRow {
    DimensionRow::new(ResourceRef::new("pages", id), None, Stage::Live).with_template_key("default")
}

/// Localized live row of `pages/{id}`.
pub fn localized_page_row(id: &str, locale: &str) -> DimensionRow {
    DimensionRow::new(ResourceRef::new("pages", id), Some(locale.to_string()), Stage::Live)
}

/// Metadata registry holding template `default` with `properties`.
pub fn default_template(properties: Vec<PropertyMetadata>) -> MetadataRegistry {
    let mut metadata = MetadataRegistry::new();
    metadata.register(TemplateMetadata::new("default", properties));
    metadata
}

/// Builder for a [`ContentResolver`] wired with test loaders.
///
/// ```rust,no_run
/// use content_resolver::test_utils::{RecordingLoader, TestResolverBuilder};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let media = Arc::new(RecordingLoader::new().with_value("1", json!({"url": "/a.png"})));
/// let resolver = TestResolverBuilder::new(2, 10).with_loader("media", media.clone()).build();
/// ```
pub struct TestResolverBuilder {
    metadata: MetadataRegistry,
    fields: Vec<(String, Arc<dyn FieldResolver>)>,
    loaders: LoaderRegistry,
    config: ResolverConfig,
}

impl TestResolverBuilder {
    /// Builder with the given limits, no metadata and no loaders.
    pub fn new(max_depth: usize, max_rounds: usize) -> Self {
        Self {
            metadata: MetadataRegistry::new(),
            fields: Vec::new(),
            loaders: LoaderRegistry::new(),
            config: ResolverConfig::new(max_depth, max_rounds),
        }
    }

    /// Use `metadata` for template lookups.
    #[must_use]
    pub fn with_metadata(mut self, metadata: MetadataRegistry) -> Self {
        self.metadata = metadata;
        self
    }

    /// Register an extra field type on top of the built-in ones.
    #[must_use]
    pub fn with_field_resolver<F: FieldResolver + 'static>(mut self, field_type: &str, resolver: F) -> Self {
        self.fields.push((field_type.to_string(), Arc::new(resolver)));
        self
    }

    /// Register a resource loader.
    #[must_use]
    pub fn with_loader<L: ResourceLoader + 'static>(mut self, loader_key: &str, loader: Arc<L>) -> Self {
        self.loaders.register_loader(loader_key, loader);
        self
    }

    /// Register a smart resolver.
    #[must_use]
    pub fn with_smart_resolver<S: SmartResolver + 'static>(mut self, loader_key: &str, resolver: Arc<S>) -> Self {
        self.loaders.register_smart_resolver(loader_key, resolver);
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the resolver with the built-in field types.
    ///
    /// # Panics
    ///
    /// Panics when the configuration is invalid.
    pub fn build(self) -> ContentResolver {
        let mut fields = FieldResolverRegistry::with_defaults(self.metadata);
        for (field_type, resolver) in self.fields {
            fields.register_shared(field_type, resolver);
        }

        ContentResolver::new(fields, self.loaders, self.config)
            .unwrap_or_else(|error| panic!("invalid test resolver configuration: {error}"))
    }
}
