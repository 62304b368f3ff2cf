//! Content Resolver preview CLI
//!
//! Command-line entry point for `content-resolve`, which resolves content
//! entities from JSON fixtures. See [`content_resolver::cli`] for commands.

use anyhow::Result;
use clap::Parser;
use content_resolver::cli;
use content_resolver::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    // Execute the command
    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
