//! Error handling for the content resolver
//!
//! This module provides the error taxonomy of the resolution engine and the
//! user-friendly reporting used by the preview CLI. The error system follows
//! two principles:
//! 1. **Strongly-typed errors** so callers can tell configuration mistakes
//!    apart from missing content
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ResolveError`] - Enumerated failure cases of the engine
//! - [`ErrorContext`] - Wrapper that adds suggestions and details
//!
//! Engine entry points return [`anyhow::Result`]. Typed errors travel inside
//! the [`anyhow::Error`] and can be recovered with
//! [`anyhow::Error::downcast_ref`]:
//!
//! ```rust,no_run
//! use content_resolver::core::ResolveError;
//!
//! fn is_not_found(error: &anyhow::Error) -> bool {
//!     matches!(error.downcast_ref::<ResolveError>(), Some(ResolveError::ContentNotFound { .. }))
//! }
//! ```
//!
//! # What is not an error
//!
//! Exceeding the configured depth or round limit never produces an error:
//! affected positions are set to `null` and reported through
//! [`ResolvedContent::truncated`](crate::resolver::ResolvedContent::truncated).
//! A localized request without a localized dimension row yields a ghost
//! snapshot, not [`ResolveError::ContentNotFound`].

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for content resolution
///
/// # Error Categories
///
/// ## Missing content
/// - [`ContentNotFound`] - the required unlocalized dimension row is absent
///
/// ## Configuration / programmer errors
/// - [`InvalidLoaderKey`] - a token was queued with a blank loader key
/// - [`LoaderNotFound`] - no loader or smart resolver is registered for a key
/// - [`UnsupportedResourceType`] - the token kind does not match what the key serves
/// - [`ConfigError`] - invalid resolver configuration
///
/// ## Collaborator failures
/// - [`LoaderFailed`] - a resource loader returned an error
/// - [`SmartResolverFailed`] - a smart resolver returned an error
/// - [`FixtureError`] - preview fixture could not be read
///
/// [`ContentNotFound`]: ResolveError::ContentNotFound
/// [`InvalidLoaderKey`]: ResolveError::InvalidLoaderKey
/// [`LoaderNotFound`]: ResolveError::LoaderNotFound
/// [`UnsupportedResourceType`]: ResolveError::UnsupportedResourceType
/// [`ConfigError`]: ResolveError::ConfigError
/// [`LoaderFailed`]: ResolveError::LoaderFailed
/// [`SmartResolverFailed`]: ResolveError::SmartResolverFailed
/// [`FixtureError`]: ResolveError::FixtureError
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No unlocalized dimension row matches the requested stage and version.
    #[error("Content '{resource_id}' not found for stage '{stage}' (version {version})")]
    ContentNotFound {
        /// Identifier of the content-bearing resource
        resource_id: String,
        /// Requested stage
        stage: String,
        /// Requested version
        version: u32,
    },

    /// A resolvable was queued with an empty or blank loader key.
    #[error("Invalid loader key '{loader_key}' for resource '{id}'")]
    InvalidLoaderKey {
        /// The offending key, verbatim
        loader_key: String,
        /// Identifier of the token carrying the key
        id: String,
        /// Registered keys, used for suggestions
        available: Vec<String>,
    },

    /// Neither a resource loader nor a smart resolver is registered under the key.
    #[error("No loader registered for key '{loader_key}'")]
    LoaderNotFound {
        /// The requested loader key
        loader_key: String,
        /// Registered keys, used for suggestions
        available: Vec<String>,
    },

    /// The token kind is not served by what is registered under the key.
    #[error("Unsupported resource type '{kind}' for loader '{loader_key}'")]
    UnsupportedResourceType {
        /// The loader key of the token
        loader_key: String,
        /// Kind of the token (`resource` or `smart`)
        kind: String,
    },

    /// A resource loader failed; the whole resolution is aborted.
    #[error("Loader '{loader_key}' failed to load {count} resource(s)")]
    LoaderFailed {
        /// The loader key
        loader_key: String,
        /// Number of ids in the failed batch
        count: usize,
        /// Error reported by the loader
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A smart resolver failed; the whole resolution is aborted.
    #[error("Smart resolver '{loader_key}' failed")]
    SmartResolverFailed {
        /// The loader key
        loader_key: String,
        /// Error reported by the smart resolver
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Resolver configuration is invalid.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// What is wrong with the configuration
        message: String,
    },

    /// A preview fixture could not be parsed.
    #[error("Invalid fixture '{path}': {reason}")]
    FixtureError {
        /// Fixture path
        path: String,
        /// Parse failure
        reason: String,
    },
}

impl ResolveError {
    /// Short machine-friendly name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContentNotFound {
                ..
            } => "content_not_found",
            Self::InvalidLoaderKey {
                ..
            } => "invalid_loader_key",
            Self::LoaderNotFound {
                ..
            } => "loader_not_found",
            Self::UnsupportedResourceType {
                ..
            } => "unsupported_resource_type",
            Self::LoaderFailed {
                ..
            } => "loader_failed",
            Self::SmartResolverFailed {
                ..
            } => "smart_resolver_failed",
            Self::ConfigError {
                ..
            } => "config_error",
            Self::FixtureError {
                ..
            } => "fixture_error",
        }
    }

    /// Whether the error means "not found" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ContentNotFound { .. })
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Displayed by the preview CLI; the error is shown in red, details in yellow
/// and the suggestion in green.
///
/// ```rust,no_run
/// use content_resolver::core::{ErrorContext, ResolveError};
///
/// let context = ErrorContext::new(ResolveError::ConfigError {
///     message: "max_rounds must be at least 1".to_string(),
/// })
/// .with_suggestion("Set max_rounds = 10 in resolver.toml");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ResolveError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: ResolveError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`ResolveError`] (also when wrapped in `anyhow` context),
/// [`toml::de::Error`] and [`serde_json::Error`]. Anything else is reported
/// as a configuration error carrying the full error chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain = format_chain(&error);

    let error = match error.downcast::<ResolveError>() {
        Ok(resolve_error) => return create_error_context(resolve_error),
        Err(error) => error,
    };

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(ResolveError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the resolver configuration. Both max_depth and max_rounds are required")
        .with_details("TOML parsing errors are usually caused by missing keys, missing quotes or mismatched brackets");
    }

    if let Some(json_error) = error.downcast_ref::<serde_json::Error>() {
        return ErrorContext::new(ResolveError::FixtureError {
            path: "<input>".to_string(),
            reason: json_error.to_string(),
        })
        .with_suggestion("Validate the fixture file with a JSON linter")
        .with_details(format!("Parse failed at line {}, column {}", json_error.line(), json_error.column()));
    }

    ErrorContext::new(ResolveError::ConfigError {
        message: chain,
    })
}

fn format_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}

/// Registered keys closest to `wanted`, best match first.
///
/// Uses Jaro-Winkler similarity and keeps candidates scoring at least 0.7.
pub fn closest_keys<'a>(wanted: &str, available: &'a [String]) -> Vec<&'a str> {
    let mut scored: Vec<(f64, &str)> = available
        .iter()
        .map(|key| (strsim::jaro_winkler(wanted, key), key.as_str()))
        .filter(|(score, _)| *score >= 0.7)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(_, key)| key).collect()
}

fn loader_suggestion(wanted: &str, available: &[String]) -> String {
    let close = closest_keys(wanted, available);
    if let Some(best) = close.first() {
        format!("Did you mean '{best}'? Register a loader for '{wanted}' or fix the field resolver")
    } else if available.is_empty() {
        "No loaders are registered. Register loaders on the LoaderRegistry before resolving".to_string()
    } else {
        format!("Registered loader keys: {}", available.join(", "))
    }
}

fn create_error_context(error: ResolveError) -> ErrorContext {
    match &error {
        ResolveError::ContentNotFound {
            resource_id,
            stage,
            ..
        } => {
            let suggestion = format!(
                "Check that resource '{resource_id}' has an unlocalized dimension row for stage '{stage}'"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Every content snapshot is built on top of the unlocalized (shared) dimension row")
        }

        ResolveError::InvalidLoaderKey {
            available,
            ..
        } => {
            let suggestion = format!(
                "Give every resource token a loader key. Registered keys: {}",
                available.join(", ")
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Resource tokens are grouped by loader key; an empty key cannot be dispatched")
        }

        ResolveError::LoaderNotFound {
            loader_key,
            available,
        } => {
            let suggestion = loader_suggestion(loader_key, available);
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Field resolvers reference loaders by key; every key must be registered")
        }

        ResolveError::UnsupportedResourceType {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Register a smart resolver for smart tokens and a resource loader for resource tokens")
            .with_details("The key exists, but serves the other kind of resolvable"),

        ResolveError::LoaderFailed {
            ..
        }
        | ResolveError::SmartResolverFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the backend behind the loader; the engine does not retry failed loads")
            .with_details("Any loader failure aborts the whole resolution, there are no partial results"),

        ResolveError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Review resolver.toml: max_depth and max_rounds are required, max_rounds must be at least 1"),

        ResolveError::FixtureError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Fixtures need 'rows', and may define 'templates', 'resources' and 'smart'"),
    }
}
