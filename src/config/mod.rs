//! Configuration for the resolution engine
//!
//! The engine has two required knobs, the maximum recursion depth and the
//! maximum number of resolution rounds, plus optional per-loader parameters.
//! Configuration is stored as TOML:
//!
//! ```toml
//! max_depth = 2
//! max_rounds = 20
//! max_concurrent_loads = 4
//!
//! [loaders.media]
//! params = { formats = ["sulu-400x400", "sulu-100x100"] }
//!
//! [loaders.page]
//! params = { properties = ["title", "url"] }
//! ```
//!
//! `max_depth` and `max_rounds` have no defaults: a configuration file
//! missing either key fails to parse.

mod resolver;

pub use resolver::{LoaderConfig, ResolverConfig};
