//! Content Resolver - resolution engine for multi-dimensional content
//!
//! Turns a persisted content entity (versioned, staged, localized) into a
//! fully materialized view object, discovering and batch-loading every
//! embedded reference (images, linked pages, smart-content queries) without
//! loading the same id twice or following references beyond a depth limit.
//!
//! # Architecture Overview
//!
//! A request flows through these stages:
//! - Dimension rows are merged into one [`dimension::ContentSnapshot`]
//!   (localized values over unlocalized ones; ghost content when the
//!   requested locale has no row)
//! - Field resolvers turn each stored field into a [`content::ContentView`]
//!   holding placeholder tokens instead of loaded references
//! - The [`resolver`] pipeline flattens views, queues tokens by priority,
//!   batch-loads one priority tier per round and substitutes the results
//! - The output is normalized into `content`, `view`, `settings` and
//!   `extension`
//!
//! ## Key Features
//!
//! - **Batching**: one loader call per loader key and priority tier
//! - **Shaping**: the same id can be loaded once and shaped several ways
//! - **Bounded**: depth and round limits truncate cycles to `null`, with
//!   the truncated positions reported
//! - **Concurrent**: loader keys of one tier load concurrently
//!
//! # Core Modules
//!
//! ## Model
//! - [`content`] - Content trees, content views and resolvable tokens
//! - [`dimension`] - Dimension rows, merging and content snapshots
//! - [`metadata`] - Template metadata consumed by field resolvers
//!
//! ## Resolution
//! - [`fields`] - Field resolver trait, registry and built-in field types
//! - [`resolver`] - Flattener, queue, batch loader, replacer, normalizer and driver
//!
//! ## Supporting Modules
//! - [`config`] - Resolver configuration (`resolver.toml`)
//! - [`core`] - Error types and resource references
//! - [`constants`] - Shared defaults and reserved names
//! - [`cli`] - The `content-resolve` preview command
//!
//! # Example
//!
//! ```toml
//! # resolver.toml
//! max_depth = 2
//! max_rounds = 10
//!
//! [loaders.page.params]
//! properties = ["title", "url"]
//! ```
//!
//! ```bash
//! content-resolve resolve --fixture page.json --config resolver.toml --resource 1 --locale en
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod content;
pub mod core;
pub mod dimension;
pub mod fields;
pub mod metadata;
pub mod resolver;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
