//! Failure-injecting group store.
//!
//! Wraps a [`MemoryStore`] and fails selected mutating calls, or every call
//! while "offline", without touching the wrapped state.

use async_trait::async_trait;
use catalog_runtime::{GroupStore, MemoryStore, StoreError, StoreResult};
use catalog_types::{CatalogItem, Division, Exclusion, Group, GroupId, ItemId};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub struct FlakyStore {
    inner: MemoryStore,
    mutations: AtomicUsize,
    failing: Mutex<Vec<usize>>,
    offline: AtomicBool,
    error: Mutex<StoreError>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            mutations: AtomicUsize::new(0),
            failing: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
            error: Mutex::new(StoreError::Transport("connection reset".to_string())),
        }
    }

    /// Fail the `n`-th mutating call from now on (1-based, counted across all
    /// mutating methods).
    pub fn fail_mutation(&self, n: usize) {
        let target = self.mutations.load(Ordering::SeqCst) + n;
        self.failing.lock().unwrap().push(target);
    }

    /// Fail every call, listings included.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Error returned by injected failures. Defaults to a transport failure.
    pub fn set_error(&self, error: StoreError) {
        *self.error.lock().unwrap() = error;
    }

    /// Mutating calls attempted so far, failed ones included.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn injected(&self) -> StoreError {
        self.error.lock().unwrap().clone()
    }

    fn check_listing(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(self.injected());
        }
        Ok(())
    }

    fn check_mutation(&self) -> StoreResult<()> {
        let n = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;
        if self.offline.load(Ordering::SeqCst) {
            return Err(self.injected());
        }
        let mut failing = self.failing.lock().unwrap();
        if let Some(pos) = failing.iter().position(|&target| target == n) {
            failing.remove(pos);
            drop(failing);
            return Err(self.injected());
        }
        Ok(())
    }
}

#[async_trait]
impl GroupStore for FlakyStore {
    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>> {
        self.check_listing()?;
        self.inner.list_items().await
    }

    async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        self.check_listing()?;
        self.inner.list_groups().await
    }

    async fn list_exclusions(&self, scope: GroupId) -> StoreResult<Vec<Exclusion>> {
        self.check_listing()?;
        self.inner.list_exclusions(scope).await
    }

    async fn add_exclusions(&self, scope: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        self.check_mutation()?;
        self.inner.add_exclusions(scope, item_ids).await
    }

    async fn remove_exclusions(&self, scope: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        self.check_mutation()?;
        self.inner.remove_exclusions(scope, item_ids).await
    }

    async fn list_divisions(&self) -> StoreResult<Vec<Division>> {
        self.check_listing()?;
        self.inner.list_divisions().await
    }

    async fn create_group(&self, id: GroupId, name: &str, item_ids: &[ItemId]) -> StoreResult<()> {
        self.check_mutation()?;
        self.inner.create_group(id, name, item_ids).await
    }

    async fn append_items(&self, group_id: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        self.check_mutation()?;
        self.inner.append_items(group_id, item_ids).await
    }

    async fn remove_items(&self, group_id: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        self.check_mutation()?;
        self.inner.remove_items(group_id, item_ids).await
    }

    async fn move_items(
        &self,
        from_group_id: GroupId,
        to_group_id: GroupId,
        item_ids: &[ItemId],
    ) -> StoreResult<()> {
        self.check_mutation()?;
        self.inner.move_items(from_group_id, to_group_id, item_ids).await
    }
}
