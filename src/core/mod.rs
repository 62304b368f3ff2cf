//! Core types shared by every stage of the resolution pipeline
//!
//! # Modules
//!
//! ## `error` - Error Handling
//! - [`ResolveError`] - typed failure cases of the engine
//! - [`ErrorContext`] - user-friendly wrapper with suggestions and details
//! - [`user_friendly_error`] - convert any error for CLI display
//!
//! ## `resource` - Resource Identity
//! - [`ResourceRef`] - identity of the content-bearing entity being resolved

pub mod error;
mod resource;

pub use error::{ErrorContext, ResolveError, closest_keys, user_friendly_error};
pub use resource::ResourceRef;
