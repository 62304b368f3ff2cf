//! Integration test suite for the content resolver
//!
//! End-to-end tests running the whole pipeline: dimension merge, field
//! resolution, batched loading across tiers, depth and round limits, and
//! output normalization. The `cli` module drives the `content-resolve`
//! binary against fixture files.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=content_resolver=debug cargo test --test integration -- --nocapture
//! ```
//!
//! # Test Organization
//!
//! - **resolution**: Full resolution of snapshots through test loaders
//! - **limits**: Depth ceiling and round limit truncation
//! - **cli**: The preview binary, fixtures and error reporting

mod limits;
mod resolution;
