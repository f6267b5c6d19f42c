//! Fixtures for canonical scenarios and on-disk snapshot files.
//!
//! Provides utilities to:
//! - Build the scenarios every layer tests against
//! - Locate and load the JSON snapshot fixtures shipped with this crate
//! - Write snapshots into temporary directories

use anyhow::{Context, Result};
use catalog_types::CatalogSnapshot;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::world::CatalogWorld;

/// Bebidas scenario: items 10, 11, 12 active, group 1 "Bebidas" holds 10 and
/// 11, group 2 "Snacks" starts empty, no exclusions.
pub fn bebidas() -> CatalogWorld {
    CatalogWorld::new()
        .with_active_items([10, 11, 12])
        .with_group(1, "Bebidas", [10, 11])
        .with_group(2, "Snacks", [])
}

/// `count` active items (ids 1..=count) all in group 1, plus an empty group 2.
pub fn bulk(count: u64) -> CatalogWorld {
    CatalogWorld::new()
        .with_active_items(1..=count)
        .with_group(1, "Origen", 1..=count)
        .with_group(2, "Destino", [])
}

/// `count` active ungrouped items; every one renders as an Unassigned row.
pub fn ungrouped(count: u64) -> CatalogWorld {
    CatalogWorld::new().with_active_items(1..=count)
}

/// Directory holding the JSON fixtures shipped with this crate.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Path of a named fixture, e.g. `almacen.json`.
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

pub fn load_fixture(name: &str) -> Result<CatalogSnapshot> {
    let path = fixture_path(name);
    CatalogSnapshot::load(&path).with_context(|| format!("Failed to load fixture {}", path.display()))
}

/// Write a snapshot as pretty JSON under `dir`.
pub fn write_snapshot(dir: &Path, name: &str, snapshot: &CatalogSnapshot) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, snapshot.to_json_pretty()?)?;
    Ok(path)
}

/// Write a snapshot into a fresh temporary directory. Keep the returned
/// [`TempDir`] alive for as long as the file is needed.
pub fn temp_snapshot(snapshot: &CatalogSnapshot) -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let path = write_snapshot(dir.path(), "catalog.json", snapshot)?;
    Ok((dir, path))
}
