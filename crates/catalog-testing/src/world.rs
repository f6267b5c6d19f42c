//! CatalogWorld pattern for declarative test setup.
//!
//! Provides a fluent interface for:
//! - Declaring items, explicit groups, exclusions and divisions
//! - Seeding in-memory or failure-injecting stores
//! - Connecting a runtime against the seeded store

use anyhow::Result;
use catalog_runtime::{CatalogRuntime, Config, MemoryStore};
use catalog_types::{
    CatalogItem, CatalogSnapshot, Division, DivisionId, Exclusion, Group, GroupId, ItemId,
};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::store::FlakyStore;

/// Backing id of the Unassigned group in every world unless overridden.
pub const UNASSIGNED_BACKING: u64 = 9000;

/// Declarative catalog builder.
///
/// # Example
/// ```no_run
/// use catalog_testing::CatalogWorld;
///
/// let snapshot = CatalogWorld::new()
///     .with_active_items([10, 11, 12])
///     .with_group(1, "Bebidas", [10, 11])
///     .snapshot();
/// assert_eq!(snapshot.items.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct CatalogWorld {
    snapshot: CatalogSnapshot,
}

impl Default for CatalogWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogWorld {
    /// Empty catalog with an Unassigned backing group at [`UNASSIGNED_BACKING`].
    pub fn new() -> Self {
        Self::bare().with_unassigned_backing(UNASSIGNED_BACKING)
    }

    /// Empty catalog without any backing groups.
    pub fn bare() -> Self {
        Self {
            snapshot: CatalogSnapshot::default(),
        }
    }

    pub fn with_unassigned_backing(mut self, id: u64) -> Self {
        self.snapshot
            .groups
            .push(Group::unassigned_backing(GroupId::new(id), "Sin asignar"));
        self
    }

    pub fn with_discontinued_backing(mut self, id: u64, members: impl IntoIterator<Item = u64>) -> Self {
        self.snapshot.groups.push(
            Group::discontinued_backing(GroupId::new(id), "Discontinuados")
                .with_members(members.into_iter().map(ItemId::new)),
        );
        self
    }

    pub fn with_active_items(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.snapshot
            .items
            .extend(ids.into_iter().map(CatalogItem::active));
        self
    }

    pub fn with_discontinued_items(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.snapshot
            .items
            .extend(ids.into_iter().map(CatalogItem::discontinued));
        self
    }

    pub fn with_item(mut self, item: CatalogItem) -> Self {
        self.snapshot.items.push(item);
        self
    }

    /// Explicit group in the main scope.
    pub fn with_group(
        mut self,
        id: u64,
        name: &str,
        members: impl IntoIterator<Item = u64>,
    ) -> Self {
        self.snapshot.groups.push(
            Group::explicit(GroupId::new(id), name).with_members(members.into_iter().map(ItemId::new)),
        );
        self
    }

    /// Explicit group owned by a division.
    pub fn with_division_group(
        mut self,
        division_id: u64,
        id: u64,
        name: &str,
        members: impl IntoIterator<Item = u64>,
    ) -> Self {
        self.snapshot.groups.push(
            Group::explicit(GroupId::new(id), name)
                .with_members(members.into_iter().map(ItemId::new))
                .in_division(DivisionId::new(division_id)),
        );
        self
    }

    /// Exclusions scoped to the first Unassigned backing group.
    pub fn with_exclusions(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        let scope = self
            .snapshot
            .groups_snapshot()
            .unassigned_backing()
            .unwrap_or(GroupId::new(UNASSIGNED_BACKING));
        self.snapshot
            .exclusions
            .extend(ids.into_iter().map(|id| Exclusion {
                group_id: scope,
                item_id: ItemId::new(id),
            }));
        self
    }

    pub fn with_division(
        mut self,
        id: u64,
        name: &str,
        visible_groups: impl IntoIterator<Item = u64>,
    ) -> Self {
        self.snapshot.divisions.push(Division {
            id: DivisionId::new(id),
            name: name.to_string(),
            visible_group_ids: visible_groups
                .into_iter()
                .map(GroupId::new)
                .collect::<BTreeSet<_>>(),
        });
        self
    }

    pub fn with_revision(mut self, revision: u64) -> Self {
        self.snapshot.revision = revision;
        self
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.snapshot.clone()
    }

    pub fn into_snapshot(self) -> CatalogSnapshot {
        self.snapshot
    }

    pub fn memory_store(&self) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::from_snapshot(self.snapshot()))
    }

    pub fn flaky_store(&self) -> Arc<FlakyStore> {
        Arc::new(FlakyStore::new(MemoryStore::from_snapshot(self.snapshot())))
    }

    /// Seed a memory store and connect a runtime to it.
    pub async fn runtime(&self, config: Config) -> Result<CatalogRuntime<MemoryStore>> {
        Ok(CatalogRuntime::connect(self.memory_store(), config).await?)
    }

    /// Connect a runtime to an already-built store (e.g. a configured [`FlakyStore`]).
    pub async fn runtime_on<S>(&self, store: Arc<S>, config: Config) -> Result<CatalogRuntime<S>>
    where
        S: catalog_runtime::GroupStore,
    {
        Ok(CatalogRuntime::connect(store, config).await?)
    }
}
