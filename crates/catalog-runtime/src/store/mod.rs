// Group store - The external data collaborator the runtime reads from and mutates
// Transport is out of scope; implementations wrap whatever protocol the host uses

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use catalog_types::{CatalogItem, Division, Exclusion, Group, GroupId, ItemId};
use std::fmt;
use std::sync::Arc;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure reported by a [`GroupStore`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No response (network down, timeout). Always worth retrying.
    Transport(String),
    /// The store answered and refused the request.
    Rejected { status: u16, message: String },
    NotFound(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Rejected { status, .. } => *status >= 500,
            StoreError::NotFound(_) => false,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transport(msg) => write!(f, "transport failure: {}", msg),
            StoreError::Rejected { status, message } => {
                write!(f, "rejected ({}): {}", status, message)
            }
            StoreError::NotFound(what) => write!(f, "not found: {}", what),
        }
    }
}

impl std::error::Error for StoreError {}

/// Inbound listings and outbound group mutations.
///
/// Exclusion calls are scoped by the Unassigned group's backing id.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>>;

    async fn list_groups(&self) -> StoreResult<Vec<Group>>;

    async fn list_exclusions(&self, scope: GroupId) -> StoreResult<Vec<Exclusion>>;

    async fn add_exclusions(&self, scope: GroupId, item_ids: &[ItemId]) -> StoreResult<()>;

    async fn remove_exclusions(&self, scope: GroupId, item_ids: &[ItemId]) -> StoreResult<()>;

    async fn list_divisions(&self) -> StoreResult<Vec<Division>>;

    async fn create_group(&self, id: GroupId, name: &str, item_ids: &[ItemId]) -> StoreResult<()>;

    async fn append_items(&self, group_id: GroupId, item_ids: &[ItemId]) -> StoreResult<()>;

    async fn remove_items(&self, group_id: GroupId, item_ids: &[ItemId]) -> StoreResult<()>;

    async fn move_items(
        &self,
        from_group_id: GroupId,
        to_group_id: GroupId,
        item_ids: &[ItemId],
    ) -> StoreResult<()>;
}

#[async_trait]
impl<S: GroupStore + ?Sized> GroupStore for Arc<S> {
    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>> {
        (**self).list_items().await
    }

    async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        (**self).list_groups().await
    }

    async fn list_exclusions(&self, scope: GroupId) -> StoreResult<Vec<Exclusion>> {
        (**self).list_exclusions(scope).await
    }

    async fn add_exclusions(&self, scope: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        (**self).add_exclusions(scope, item_ids).await
    }

    async fn remove_exclusions(&self, scope: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        (**self).remove_exclusions(scope, item_ids).await
    }

    async fn list_divisions(&self) -> StoreResult<Vec<Division>> {
        (**self).list_divisions().await
    }

    async fn create_group(&self, id: GroupId, name: &str, item_ids: &[ItemId]) -> StoreResult<()> {
        (**self).create_group(id, name, item_ids).await
    }

    async fn append_items(&self, group_id: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        (**self).append_items(group_id, item_ids).await
    }

    async fn remove_items(&self, group_id: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        (**self).remove_items(group_id, item_ids).await
    }

    async fn move_items(
        &self,
        from_group_id: GroupId,
        to_group_id: GroupId,
        item_ids: &[ItemId],
    ) -> StoreResult<()> {
        (**self).move_items(from_group_id, to_group_id, item_ids).await
    }
}
