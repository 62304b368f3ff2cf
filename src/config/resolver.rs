//! Resolver configuration loading, saving and validation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

use crate::constants::DEFAULT_MAX_CONCURRENT_LOADS;
use crate::core::ResolveError;

const fn default_max_concurrent_loads() -> usize {
    DEFAULT_MAX_CONCURRENT_LOADS
}

fn is_default_max_concurrent_loads(value: &usize) -> bool {
    *value == DEFAULT_MAX_CONCURRENT_LOADS
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Settings for a single loader key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Parameters handed to the loader on every batch call.
    #[serde(default = "empty_params")]
    pub params: Value,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            params: empty_params(),
        }
    }
}

/// Runtime limits and loader parameters of a [`ContentResolver`](crate::resolver::ContentResolver).
///
/// # Limits
///
/// - `max_depth`: resolvables discovered deeper than this are never loaded
///   and resolve to `null`. Depth 0 is the snapshot's own fields.
/// - `max_rounds`: number of tiers extracted before the driver stops;
///   whatever is still unresolved becomes `null`.
///
/// Both limits double as protection against cyclic references.
///
/// # Examples
///
/// ```rust
/// use content_resolver::config::ResolverConfig;
///
/// let config = ResolverConfig::new(2, 10);
/// assert!(config.validate().is_ok());
/// assert!(config.loader_params("media").is_object());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum depth at which resolvables are still loaded.
    pub max_depth: usize,

    /// Maximum number of tiers processed per resolution.
    pub max_rounds: usize,

    /// Number of loader-key batches of one tier dispatched concurrently.
    #[serde(
        default = "default_max_concurrent_loads",
        skip_serializing_if = "is_default_max_concurrent_loads"
    )]
    pub max_concurrent_loads: usize,

    /// Per-loader settings keyed by loader key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub loaders: BTreeMap<String, LoaderConfig>,
}

impl ResolverConfig {
    /// Create a configuration with the two required limits.
    pub fn new(max_depth: usize, max_rounds: usize) -> Self {
        Self {
            max_depth,
            max_rounds,
            max_concurrent_loads: DEFAULT_MAX_CONCURRENT_LOADS,
            loaders: BTreeMap::new(),
        }
    }

    /// Set how many loader-key batches may run at once.
    #[must_use]
    pub fn with_max_concurrent_loads(mut self, max_concurrent_loads: usize) -> Self {
        self.max_concurrent_loads = max_concurrent_loads;
        self
    }

    /// Attach parameters for one loader key.
    #[must_use]
    pub fn with_loader_params(mut self, loader_key: impl Into<String>, params: Value) -> Self {
        self.loaders.insert(
            loader_key.into(),
            LoaderConfig {
                params,
            },
        );
        self
    }

    /// Parameters configured for `loader_key`, or an empty object.
    pub fn loader_params(&self, loader_key: &str) -> Value {
        self.loaders.get(loader_key).map_or_else(empty_params, |loader| loader.params.clone())
    }

    /// Check the limits and loader keys.
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(ResolveError::ConfigError {
                message: "max_rounds must be at least 1".to_string(),
            }
            .into());
        }

        if self.max_concurrent_loads == 0 {
            return Err(ResolveError::ConfigError {
                message: "max_concurrent_loads must be at least 1".to_string(),
            }
            .into());
        }

        if let Some(blank) = self.loaders.keys().find(|key| key.trim().is_empty()) {
            return Err(ResolveError::ConfigError {
                message: format!("loader key '{blank}' is blank"),
            }
            .into());
        }

        Ok(())
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse resolver config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read resolver config from {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Invalid resolver config in {}", path.display()))
    }

    /// Write the configuration as TOML, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content =
            toml::to_string_pretty(self).context("Failed to serialize resolver config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write resolver config to {}", path.display()))
    }
}
