//! Testing infrastructure for catalog integration tests.
//!
//! This crate provides utilities for writing robust integration tests:
//! - `CatalogWorld`: Fluent interface for declarative catalog setup
//! - `FlakyStore`: Group store wrapper that injects store failures
//! - `assertions`: Partition invariant checks
//! - `fixtures`: Canonical scenarios and on-disk snapshot fixtures

pub mod assertions;
pub mod fixtures;
pub mod store;
pub mod world;

pub use store::FlakyStore;
pub use world::CatalogWorld;
