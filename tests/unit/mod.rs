//! Unit test suite for the content resolver
//!
//! These tests exercise single pipeline components through the public API:
//! queue ordering and merge laws, flattening and replacement, batch loading,
//! dimension merging and configuration. They need no fixtures on disk
//! (apart from the config round-trip) and run in milliseconds.
//!
//! # Running Unit Tests
//!
//! ```bash
//! cargo test --test unit
//! ```

mod config;
mod dimension;
mod loader;
mod queue;
mod replacement;
