//! The `resolve` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::fixture::Fixture;
use crate::config::ResolverConfig;
use crate::core::ResolveError;
use crate::dimension::{DimensionAttributes, Stage};
use crate::resolver::ContentResolver;

/// Resolve one resource of a fixture and print the result as JSON.
///
/// # Examples
///
/// ```bash
/// content-resolve resolve --fixture page.json --config resolver.toml --resource 1
/// content-resolve resolve --fixture page.json --config resolver.toml --resource 1 \
///     --locale en --stage draft --property title --property excerpt.description
/// ```
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Fixture file with dimension rows, templates and loader data.
    #[arg(long)]
    fixture: PathBuf,

    /// Resolver configuration (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Id of the resource to resolve.
    #[arg(long)]
    resource: String,

    /// Resource key, when several entity types share ids.
    #[arg(long)]
    resource_key: Option<String>,

    /// Requested locale; omit to resolve unlocalized data only.
    #[arg(long)]
    locale: Option<String>,

    /// Stage to resolve.
    #[arg(long, default_value = "live")]
    stage: Stage,

    /// Dimension version to resolve.
    #[arg(long, default_value_t = 0)]
    dimension_version: u32,

    /// Restrict output to these fields (`name` or `group.name`); repeatable.
    #[arg(long = "property")]
    properties: Vec<String>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

impl ResolveCommand {
    /// Run the command.
    pub async fn execute(self) -> Result<()> {
        let fixture = Fixture::load(&self.fixture).await?;
        let config = ResolverConfig::load_from(&self.config).await?;

        let rows = fixture.rows_for(&self.resource, self.resource_key.as_deref());
        if rows.is_empty() {
            return Err(ResolveError::ContentNotFound {
                resource_id: self.resource.clone(),
                stage: self.stage.to_string(),
                version: self.dimension_version,
            }
            .into());
        }

        let mut attributes = DimensionAttributes::new(self.stage).with_version(self.dimension_version);
        if let Some(locale) = &self.locale {
            attributes = attributes.with_locale(locale.clone());
        }

        let resolver =
            ContentResolver::new(fixture.field_registry()?, fixture.loader_registry(), config)?;
        let properties = (!self.properties.is_empty()).then_some(self.properties.as_slice());

        let resolved = resolver.resolve_rows(&rows, &attributes, properties).await?;
        tracing::info!(
            "Resolved '{}' ({} truncated position(s))",
            resolved.resource,
            resolved.truncated.len()
        );

        let output = if self.pretty {
            serde_json::to_string_pretty(&resolved)
        } else {
            serde_json::to_string(&resolved)
        }
        .context("Failed to serialize resolved content")?;

        println!("{output}");
        Ok(())
    }
}
