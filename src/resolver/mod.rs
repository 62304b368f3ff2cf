//! The content resolution pipeline.
//!
//! This module turns a merged [`ContentSnapshot`] into a fully materialized
//! [`ResolvedContent`]: every embedded reference (images, linked pages,
//! smart-content queries) is discovered, batch-loaded and substituted in
//! place, without loading the same id twice and without following
//! references beyond a configured depth.
//!
//! # Architecture Overview
//!
//! Resolution runs as a loop over five stages:
//!
//! 1. **Field resolution** ([`crate::fields`]) - each stored field becomes a
//!    [`ContentView`] holding [`Resolvable`](crate::content::Resolvable) tokens
//! 2. **Flattening** ([`flattener`]) - views are peeled into content and view
//!    trees; tokens are queued with the depth they were found at
//! 3. **Tier extraction** ([`queue`]) - the highest remaining priority is
//!    removed from the queue as one tier
//! 4. **Batch loading** ([`loader`]) - one loader call per loader key, keys
//!    dispatched concurrently
//! 5. **Replacement** ([`replacer`]) - tokens are swapped for loaded values;
//!    loaded values exposing further tokens feed the queue again
//!
//! Stages 3 to 5 repeat until the queue is empty or `max_rounds` rounds
//! have run. [`normalizer`] then produces the output shape.
//!
//! # Limits
//!
//! Both limits come from [`ResolverConfig`] and are never errors:
//!
//! - a token deeper than `max_depth` becomes `null`
//! - tokens still pending after `max_rounds` rounds become `null`
//!
//! Every position truncated this way is listed in
//! [`ResolvedContent::truncated`]. Limits also stop cyclic references
//! (A links B links A): each hop adds one level of depth.
//!
//! # Example
//!
//! ```rust,no_run
//! use content_resolver::config::ResolverConfig;
//! use content_resolver::dimension::{DimensionAttributes, Stage};
//! use content_resolver::fields::FieldResolverRegistry;
//! use content_resolver::metadata::MetadataRegistry;
//! use content_resolver::resolver::{ContentResolver, LoaderRegistry};
//!
//! # async fn example(rows: Vec<content_resolver::dimension::DimensionRow>) -> anyhow::Result<()> {
//! let resolver = ContentResolver::new(
//!     FieldResolverRegistry::with_defaults(MetadataRegistry::new()),
//!     LoaderRegistry::new(),
//!     ResolverConfig::new(2, 10),
//! )?;
//!
//! let resolved = resolver
//!     .resolve_rows(&rows, &DimensionAttributes::new(Stage::Live).with_locale("en"), None)
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&resolved)?);
//! # Ok(())
//! # }
//! ```

pub mod flattener;
pub mod loader;
pub mod normalizer;
pub mod queue;
pub mod replacer;

pub use loader::{
    BatchLoader, LoaderRegistry, ResolvedResource, ResolvedResources, ResourceLoader, SmartResolver,
};
pub use normalizer::{ResolvedContent, ResolvedViews};
pub use queue::{ExtractedTier, ResolutionQueue};

use anyhow::Result;
use std::collections::BTreeMap;

use crate::config::ResolverConfig;
use crate::content::ContentView;
use crate::dimension::{ContentSnapshot, DimensionAttributes, DimensionMerger, DimensionRow};
use crate::fields::FieldResolverRegistry;
use replacer::{Resolution, TokenReplacer};

/// Drives field resolution, batch loading and normalization.
pub struct ContentResolver {
    fields: FieldResolverRegistry,
    loaders: LoaderRegistry,
    config: ResolverConfig,
}

impl ContentResolver {
    /// Create a resolver. Fails when `config` is invalid.
    pub fn new(fields: FieldResolverRegistry, loaders: LoaderRegistry, config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fields,
            loaders,
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Merge `rows` for `attributes`, then resolve the snapshot.
    pub async fn resolve_rows(
        &self,
        rows: &[DimensionRow],
        attributes: &DimensionAttributes,
        properties: Option<&[String]>,
    ) -> Result<ResolvedContent> {
        let snapshot = DimensionMerger::merge(rows, attributes)?;
        self.resolve(&snapshot, properties).await
    }

    /// Resolve a snapshot. `properties` restricts the resolved fields (see
    /// [`FieldResolverRegistry::resolve`]).
    pub async fn resolve(
        &self,
        snapshot: &ContentSnapshot,
        properties: Option<&[String]>,
    ) -> Result<ResolvedContent> {
        tracing::debug!(
            "Resolving '{}' (locale: {:?}, stage: {})",
            snapshot.resource,
            snapshot.effective_locale(),
            snapshot.stage
        );

        let views = self.fields.resolve(snapshot, properties);
        let resolved = self.resolve_content_views(views, snapshot.effective_locale()).await?;
        Ok(normalizer::normalize(snapshot.resource.clone(), resolved))
    }

    /// Resolve named content views, without the output normalization.
    ///
    /// Truncation pointers are relative to the map of views.
    pub async fn resolve_content_views(
        &self,
        views: BTreeMap<String, ContentView>,
        locale: Option<&str>,
    ) -> Result<ResolvedViews> {
        let mut queue = ResolutionQueue::new();
        let mut resolution = Resolution::new(flattener::resolve_views(views, 0, &mut queue));
        let loader = BatchLoader::new(&self.loaders, &self.config);

        let mut rounds = 0;
        while !queue.is_empty() && rounds < self.config.max_rounds {
            rounds += 1;

            let tier = queue.extract_top_tier(self.config.max_depth);
            tracing::debug!(
                "Round {}: priority {:?}, {} loader key(s), {} queued",
                rounds,
                tier.priority,
                tier.resources_to_load.len(),
                queue.len()
            );

            let resolved = if tier.is_empty() {
                ResolvedResources::new()
            } else {
                loader.load_resources(tier.resources_to_load, locale).await?
            };

            // Runs even without loads so that tokens beyond the depth limit are cut.
            TokenReplacer::new(&resolved, &tier.loader_id_depths, self.config.max_depth, &mut queue)
                .replace_all(&mut resolution);
        }

        if resolution.has_pending() {
            let dropped = resolution.truncate_pending();
            tracing::warn!(
                "Round limit of {} reached, {} unresolved reference(s) set to null",
                self.config.max_rounds,
                dropped
            );
        } else if !resolution.truncated.is_empty() {
            tracing::warn!(
                "{} reference(s) beyond depth {} set to null",
                resolution.truncated.len(),
                self.config.max_depth
            );
        }

        tracing::debug!("Resolution finished after {} round(s)", rounds);
        Ok(normalizer::splice_views(resolution))
    }
}
