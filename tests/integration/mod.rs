//! Integration test suite for cmeta
//!
//! End-to-end tests of the public API and the `cmeta` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **root_cache**: Root component metadata caching and invalidation
//! - **metadata_rules**: Rule ordering, input resolution and status validation
//! - **artifact_view**: View filtering, laziness and transform memoisation
//! - **cli**: The `cmeta` commands against descriptor fixtures

#[path = "../common/mod.rs"]
mod common;

mod artifact_view;
mod cli;
mod metadata_rules;
mod root_cache;
