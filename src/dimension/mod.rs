//! Dimension rows and merged content snapshots.
//!
//! A content-bearing entity stores its state as a set of dimension rows,
//! one per `(locale, stage, version)` combination. The row with
//! `locale = None` holds unlocalized (shared) data; localized rows hold the
//! per-language data. Resolving content always starts by merging the rows
//! needed for one request into a [`ContentSnapshot`]:
//!
//! ```rust
//! use content_resolver::core::ResourceRef;
//! use content_resolver::dimension::{DimensionAttributes, DimensionMerger, DimensionRow, Stage};
//! use serde_json::json;
//!
//! let resource = ResourceRef::new("pages", "1");
//! let rows = vec![
//!     DimensionRow::new(resource.clone(), None, Stage::Live)
//!         .with_template_value("layout", json!("wide")),
//!     DimensionRow::new(resource, Some("en".to_string()), Stage::Live)
//!         .with_template_value("title", json!("Hello")),
//! ];
//!
//! let snapshot = DimensionMerger::merge(&rows, &DimensionAttributes::new(Stage::Live).with_locale("en"))?;
//! assert_eq!(snapshot.template_data["title"], json!("Hello"));
//! assert_eq!(snapshot.template_data["layout"], json!("wide"));
//! # Ok::<(), anyhow::Error>(())
//! ```

mod merger;

pub use merger::{DimensionKey, DimensionMerger};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::{ResolveError, ResourceRef};

/// Publication stage of a dimension row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Working copy edited in the administration.
    Draft,
    /// Published state.
    Live,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Live => write!(f, "live"),
        }
    }
}

impl FromStr for Stage {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "live" => Ok(Self::Live),
            other => Err(ResolveError::ConfigError {
                message: format!("unknown stage '{other}', expected 'draft' or 'live'"),
            }),
        }
    }
}

/// One persisted slice of content state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRow {
    /// Entity owning the row.
    pub resource: ResourceRef,
    /// Locale of the row; `None` for the unlocalized row.
    #[serde(default)]
    pub locale: Option<String>,
    /// Publication stage.
    pub stage: Stage,
    /// Version number; 0 is the current version.
    #[serde(default)]
    pub version: u32,
    /// Template used to interpret `template_data`.
    #[serde(default)]
    pub template_key: Option<String>,
    /// Raw template field values.
    #[serde(default)]
    pub template_data: Map<String, Value>,
    /// Locale shown when a requested locale has no localized row.
    #[serde(default)]
    pub ghost_locale: Option<String>,
    /// Authoring timestamp.
    #[serde(default)]
    pub authored: Option<DateTime<Utc>>,
    /// Trait data namespaced by trait (`excerpt`, `seo`, `route`, `workflow`, ...).
    #[serde(default)]
    pub extensions: BTreeMap<String, Map<String, Value>>,
}

impl DimensionRow {
    /// Empty row for `resource` in `locale` and `stage`, version 0.
    pub fn new(resource: ResourceRef, locale: Option<String>, stage: Stage) -> Self {
        Self {
            resource,
            locale,
            stage,
            version: 0,
            template_key: None,
            template_data: Map::new(),
            ghost_locale: None,
            authored: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the template key.
    #[must_use]
    pub fn with_template_key(mut self, template_key: impl Into<String>) -> Self {
        self.template_key = Some(template_key.into());
        self
    }

    /// Set one template field.
    #[must_use]
    pub fn with_template_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.template_data.insert(name.into(), value);
        self
    }

    /// Set one field of a trait's extension data.
    #[must_use]
    pub fn with_extension_value(
        mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.extensions.entry(group.into()).or_default().insert(name.into(), value);
        self
    }

    /// Set the ghost locale.
    #[must_use]
    pub fn with_ghost_locale(mut self, locale: impl Into<String>) -> Self {
        self.ghost_locale = Some(locale.into());
        self
    }

    /// Set the authoring timestamp.
    #[must_use]
    pub fn with_authored(mut self, authored: DateTime<Utc>) -> Self {
        self.authored = Some(authored);
        self
    }

    /// Whether this is the unlocalized row.
    pub fn is_unlocalized(&self) -> bool {
        self.locale.is_none()
    }
}

/// Selection criteria for one merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionAttributes {
    /// Requested locale; `None` merges the unlocalized row only.
    pub locale: Option<String>,
    /// Requested stage.
    pub stage: Stage,
    /// Requested version.
    pub version: u32,
}

impl DimensionAttributes {
    /// Attributes for the current version of `stage`, without locale.
    pub fn new(stage: Stage) -> Self {
        Self {
            locale: None,
            stage,
            version: 0,
        }
    }

    /// Request a locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Request a version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

/// Logical content state for one `(locale, stage)` request.
///
/// When a locale was requested but no localized row exists, `locale` is
/// `None` while `requested_locale` keeps the request: the snapshot is a ghost
/// built from unlocalized data only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentSnapshot {
    /// Entity the snapshot belongs to.
    pub resource: ResourceRef,
    /// Locale of the merged localized row, `None` for ghosts and unlocalized requests.
    pub locale: Option<String>,
    /// Locale that was requested.
    pub requested_locale: Option<String>,
    /// Stage of the merged rows.
    pub stage: Stage,
    /// Version of the merged rows.
    pub version: u32,
    /// Template key, localized row first.
    pub template_key: Option<String>,
    /// Merged template fields; localized values take precedence.
    pub template_data: Map<String, Value>,
    /// Merged trait data, namespaced by trait.
    pub extensions: BTreeMap<String, Map<String, Value>>,
    /// Locales having a localized row for this stage and version.
    pub available_locales: Vec<String>,
    /// Locale to fall back to for ghost content.
    pub ghost_locale: Option<String>,
    /// Authoring timestamp, localized row first.
    pub authored: Option<DateTime<Utc>>,
}

impl ContentSnapshot {
    /// Whether a locale was requested but only unlocalized data exists.
    pub fn is_ghost(&self) -> bool {
        self.requested_locale.is_some() && self.locale.is_none()
    }

    /// Locale handed to loaders: the merged locale, else the requested one.
    pub fn effective_locale(&self) -> Option<&str> {
        self.locale.as_deref().or(self.requested_locale.as_deref())
    }

    /// Data of one extension trait.
    pub fn extension(&self, group: &str) -> Option<&Map<String, Value>> {
        self.extensions.get(group)
    }
}
