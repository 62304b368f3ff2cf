//! Command-line interface for previewing content resolution.
//!
//! The `content-resolve` binary runs the resolution engine against a JSON
//! fixture (dimension rows, template metadata and static loader data) and
//! prints the resolved content as JSON. It is meant for inspecting how a
//! template resolves without a backend.
//!
//! # Commands
//!
//! - `resolve` - Resolve one resource of a fixture
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all logging
//!
//! Logs go to stderr; stdout carries only the resolved JSON.
//!
//! # Examples
//!
//! ```bash
//! content-resolve resolve --fixture page.json --config resolver.toml --resource 1
//! content-resolve --verbose resolve --fixture page.json --config resolver.toml \
//!     --resource 1 --locale de --stage draft --property title --pretty
//! RUST_LOG=content_resolver::resolver=trace content-resolve resolve ...
//! ```

mod fixture;
mod resolve;

pub use fixture::{Fixture, StaticLoader, StaticSmartResolver};
pub use resolve::ResolveCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set; `None` disables logging.
    pub log_level: Option<String>,
}

impl CliConfig {
    /// Configuration with logging disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global `tracing` subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over `log_level`. Calling this more than
    /// once is harmless; only the first subscriber is kept.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::new(level)
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Preview the content resolution engine.
#[derive(Parser)]
#[command(
    name = "content-resolve",
    version,
    about = "Resolve multi-dimensional content with batched reference loading",
    long_about = "Resolves a content entity from a JSON fixture: merges its dimension rows, \
                  resolves template fields, batch-loads every referenced resource and prints \
                  the normalized result as JSON."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output (equivalent to `RUST_LOG=debug`).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all logging. Errors are still reported.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one resource of a fixture and print it as JSON.
    ///
    /// See [`ResolveCommand`] for options.
    Resolve(ResolveCommand),
}

impl Cli {
    /// Execute the parsed command line.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Build a [`CliConfig`] from the global flags.
    ///
    /// - `--verbose` logs at `debug`
    /// - `--quiet` disables logging
    /// - otherwise logs at `info`
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
        }
    }

    /// Execute with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Resolve(cmd) => cmd.execute().await,
        }
    }
}
