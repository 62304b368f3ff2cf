//! Batch loading of one extracted tier.
//!
//! Resource tokens sharing a loader key are loaded with a single
//! [`ResourceLoader::load`] call; smart tokens are handed one by one to the
//! [`SmartResolver`] registered under their key. Batches of different loader
//! keys run concurrently, bounded by
//! [`ResolverConfig::max_concurrent_loads`](crate::config::ResolverConfig::max_concurrent_loads).
//!
//! Raw values are cached per `(loader key, id)` for the lifetime of one
//! [`BatchLoader`], so an id needed again in a later tier is not fetched
//! twice. Shaping through the token's post-process callback happens per
//! metadata identifier, after the raw fetch.

use anyhow::Result;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::queue::{IdMap, ResourcesToLoad};
use crate::config::ResolverConfig;
use crate::content::{Content, ContentView, Resolvable, ResourceToken, SmartToken};
use crate::core::ResolveError;

/// Loads raw values by id.
///
/// Unknown ids are omitted from the returned map; they are not an error.
pub trait ResourceLoader: Send + Sync {
    /// Load `ids` in `locale`. `params` are the loader's configured parameters.
    fn load<'a>(
        &'a self,
        ids: &'a [String],
        locale: Option<&'a str>,
        params: &'a Value,
    ) -> BoxFuture<'a, Result<HashMap<String, Value>>>;
}

/// Runs smart-content queries.
pub trait SmartResolver: Send + Sync {
    /// Resolve `token` in `locale` into content and view. The content may
    /// contain further resolvables.
    fn resolve<'a>(&'a self, token: &'a SmartToken, locale: Option<&'a str>) -> BoxFuture<'a, Result<ContentView>>;
}

/// Loaded value of one token.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedResource {
    /// Shaped value of a resource token.
    Value(Content),
    /// Result of a smart query.
    View(ContentView),
}

/// `loader key -> id -> metadata identifier -> resolved value`.
pub type ResolvedResources = BTreeMap<String, IdMap<ResolvedResource>>;

/// Resource loaders and smart resolvers by loader key.
#[derive(Default, Clone)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Arc<dyn ResourceLoader>>,
    smart_resolvers: HashMap<String, Arc<dyn SmartResolver>>,
}

impl LoaderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the resource loader for `loader_key`.
    pub fn register_loader(&mut self, loader_key: impl Into<String>, loader: Arc<dyn ResourceLoader>) {
        self.loaders.insert(loader_key.into(), loader);
    }

    /// Register (or replace) the smart resolver for `loader_key`.
    pub fn register_smart_resolver(
        &mut self,
        loader_key: impl Into<String>,
        resolver: Arc<dyn SmartResolver>,
    ) {
        self.smart_resolvers.insert(loader_key.into(), resolver);
    }

    /// Resource loader for `loader_key`.
    pub fn loader(&self, loader_key: &str) -> Option<&Arc<dyn ResourceLoader>> {
        self.loaders.get(loader_key)
    }

    /// Smart resolver for `loader_key`.
    pub fn smart_resolver(&self, loader_key: &str) -> Option<&Arc<dyn SmartResolver>> {
        self.smart_resolvers.get(loader_key)
    }

    /// All registered keys, sorted and deduplicated.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> =
            self.loaders.keys().chain(self.smart_resolvers.keys()).cloned().collect();
        keys.sort();
        keys.dedup();
        keys
    }

    fn unregistered(&self, loader_key: &str, kind: &str) -> ResolveError {
        let served_otherwise = match kind {
            "resource" => self.smart_resolvers.contains_key(loader_key),
            _ => self.loaders.contains_key(loader_key),
        };

        if served_otherwise {
            ResolveError::UnsupportedResourceType {
                loader_key: loader_key.to_string(),
                kind: kind.to_string(),
            }
        } else {
            ResolveError::LoaderNotFound {
                loader_key: loader_key.to_string(),
                available: self.keys(),
            }
        }
    }
}

/// Loads tiers for one resolution.
pub struct BatchLoader<'a> {
    registry: &'a LoaderRegistry,
    config: &'a ResolverConfig,
    raw_cache: DashMap<(String, String), Option<Value>>,
}

impl<'a> BatchLoader<'a> {
    /// Loader over `registry` with an empty raw cache.
    pub fn new(registry: &'a LoaderRegistry, config: &'a ResolverConfig) -> Self {
        Self {
            registry,
            config,
            raw_cache: DashMap::new(),
        }
    }

    /// Number of raw values cached so far, including ids a loader did not return.
    pub fn cached(&self) -> usize {
        self.raw_cache.len()
    }

    /// Load every entry of one tier.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidLoaderKey`] for a blank loader key
    /// - [`ResolveError::LoaderNotFound`] when nothing is registered for a key
    /// - [`ResolveError::UnsupportedResourceType`] when the key only serves the other token kind
    /// - [`ResolveError::LoaderFailed`] / [`ResolveError::SmartResolverFailed`] when a collaborator fails
    pub async fn load_resources(
        &self,
        resources: ResourcesToLoad,
        locale: Option<&str>,
    ) -> Result<ResolvedResources> {
        for (loader_key, ids) in &resources {
            if loader_key.trim().is_empty() {
                return Err(ResolveError::InvalidLoaderKey {
                    loader_key: loader_key.clone(),
                    id: ids.keys().next().cloned().unwrap_or_default(),
                    available: self.registry.keys(),
                }
                .into());
            }
        }

        let concurrency = self.config.max_concurrent_loads.max(1);
        let results: Vec<Result<(String, IdMap<ResolvedResource>)>> = stream::iter(resources)
            .map(|(loader_key, entries)| async move {
                let resolved = self.load_group(&loader_key, entries, locale).await?;
                Ok((loader_key, resolved))
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut resolved = ResolvedResources::new();
        for result in results {
            let (loader_key, values) = result?;
            resolved.insert(loader_key, values);
        }
        Ok(resolved)
    }

    async fn load_group(
        &self,
        loader_key: &str,
        entries: IdMap<Resolvable>,
        locale: Option<&str>,
    ) -> Result<IdMap<ResolvedResource>> {
        let mut resources: Vec<(String, String, ResourceToken)> = Vec::new();
        let mut smart: Vec<(String, String, SmartToken)> = Vec::new();
        for (id, shapes) in entries {
            for (metadata_identifier, resolvable) in shapes {
                match resolvable {
                    Resolvable::Resource(token) => resources.push((id.clone(), metadata_identifier, token)),
                    Resolvable::Smart(token) => smart.push((id.clone(), metadata_identifier, token)),
                }
            }
        }

        let mut resolved = IdMap::new();

        if !resources.is_empty() {
            self.fetch_raw(loader_key, &resources, locale).await?;

            for (id, metadata_identifier, token) in resources {
                let raw = self
                    .raw_cache
                    .get(&(loader_key.to_string(), id.clone()))
                    .and_then(|entry| entry.value().clone());
                resolved
                    .entry(id)
                    .or_insert_with(BTreeMap::new)
                    .insert(metadata_identifier, ResolvedResource::Value(token.shape(raw.as_ref())));
            }
        }

        if !smart.is_empty() {
            let resolver = self
                .registry
                .smart_resolver(loader_key)
                .ok_or_else(|| self.registry.unregistered(loader_key, "smart"))?;

            for (id, metadata_identifier, token) in smart {
                tracing::trace!("Running smart query '{}' on '{}'", id, loader_key);
                let view = resolver.resolve(&token, locale).await.map_err(|error| {
                    ResolveError::SmartResolverFailed {
                        loader_key: loader_key.to_string(),
                        source: error.into(),
                    }
                })?;
                resolved
                    .entry(id)
                    .or_insert_with(BTreeMap::new)
                    .insert(metadata_identifier, ResolvedResource::View(view));
            }
        }

        Ok(resolved)
    }

    /// Fetch every id of the batch that is not cached yet, in one call.
    async fn fetch_raw(
        &self,
        loader_key: &str,
        resources: &[(String, String, ResourceToken)],
        locale: Option<&str>,
    ) -> Result<()> {
        let loader = self
            .registry
            .loader(loader_key)
            .ok_or_else(|| self.registry.unregistered(loader_key, "resource"))?;

        let mut ids: Vec<String> = resources
            .iter()
            .map(|(id, _, _)| id.clone())
            .filter(|id| !self.raw_cache.contains_key(&(loader_key.to_string(), id.clone())))
            .collect();
        ids.sort();
        ids.dedup();

        if ids.is_empty() {
            tracing::debug!("All ids for '{}' served from cache", loader_key);
            return Ok(());
        }

        tracing::debug!("Loading {} id(s) through '{}'", ids.len(), loader_key);
        let params = self.config.loader_params(loader_key);
        let mut loaded = loader.load(&ids, locale, &params).await.map_err(|error| {
            ResolveError::LoaderFailed {
                loader_key: loader_key.to_string(),
                count: ids.len(),
                source: error.into(),
            }
        })?;

        for id in ids {
            let value = loaded.remove(&id);
            if value.is_none() {
                tracing::debug!("Loader '{}' did not return '{}'", loader_key, id);
            }
            self.raw_cache.insert((loader_key.to_string(), id), value);
        }
        Ok(())
    }
}
