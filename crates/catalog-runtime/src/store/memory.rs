use async_trait::async_trait;
use catalog_types::{
    CatalogItem, CatalogSnapshot, Division, Exclusion, Group, GroupId, GroupKind, GroupMember,
    ItemId,
};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::debug;

use super::{GroupStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    items: Vec<CatalogItem>,
    groups: Vec<Group>,
    exclusions: Vec<Exclusion>,
    divisions: Vec<Division>,
    revision: u64,
    calls: Vec<String>,
}

impl Inner {
    fn member(&self, item_id: ItemId) -> GroupMember {
        match self.items.iter().find(|item| item.id == item_id) {
            Some(item) => GroupMember::with_attributes(item_id, item.attributes()),
            None => GroupMember::bare(item_id),
        }
    }

    fn explicit_index(&self, id: GroupId) -> StoreResult<usize> {
        match self.groups.iter().position(|g| g.id == Some(id)) {
            Some(pos) if self.groups[pos].kind == GroupKind::Explicit => Ok(pos),
            Some(_) => Err(StoreError::Rejected {
                status: 422,
                message: format!("group {} does not accept members", id),
            }),
            None => Err(StoreError::NotFound(format!("group {}", id))),
        }
    }

    fn check_scope(&self, scope: GroupId) -> StoreResult<()> {
        let known = self
            .groups
            .iter()
            .any(|g| g.id == Some(scope) && g.kind == GroupKind::Unassigned);
        if known {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("exclusion scope {}", scope)))
        }
    }

    /// Server-side invariant: an item lives in at most one explicit group.
    fn detach(&mut self, item_ids: &HashSet<ItemId>, keep: usize) {
        for (pos, group) in self.groups.iter_mut().enumerate() {
            if pos != keep && group.kind == GroupKind::Explicit {
                group.members.retain(|m| !item_ids.contains(&m.item_id));
            }
        }
    }

    fn append(&mut self, pos: usize, item_ids: &[ItemId]) {
        let mut present: HashSet<ItemId> = self.groups[pos].member_ids().collect();
        let fresh: Vec<GroupMember> = item_ids
            .iter()
            .filter(|id| present.insert(**id))
            .map(|id| self.member(*id))
            .collect();
        self.groups[pos].members.extend(fresh);
        let moved: HashSet<ItemId> = item_ids.iter().copied().collect();
        self.detach(&moved, pos);
    }

    fn record(&mut self, call: String) {
        self.revision += 1;
        debug!(revision = self.revision, %call, "memory store mutation");
        self.calls.push(call);
    }
}

/// In-process [`GroupStore`] with the server-side rules of a real catalog
/// backend: single explicit membership, case-insensitive unique names and a
/// revision bumped on every mutation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: snapshot.items,
                groups: snapshot.groups,
                exclusions: snapshot.exclusions,
                divisions: snapshot.divisions,
                revision: snapshot.revision,
                calls: Vec::new(),
            }),
        }
    }

    /// Current server state as one document.
    pub async fn snapshot(&self) -> CatalogSnapshot {
        let inner = self.inner.lock().await;
        CatalogSnapshot {
            business_id: None,
            revision: inner.revision,
            items: inner.items.clone(),
            groups: inner.groups.clone(),
            exclusions: inner.exclusions.clone(),
            divisions: inner.divisions.clone(),
        }
    }

    pub async fn revision(&self) -> u64 {
        self.inner.lock().await.revision
    }

    /// Mutating calls received so far, e.g. `append_items(2, 250)`.
    pub async fn calls(&self) -> Vec<String> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn members(&self, group_id: GroupId) -> Vec<ItemId> {
        let inner = self.inner.lock().await;
        inner
            .groups
            .iter()
            .find(|g| g.id == Some(group_id))
            .map(|g| g.member_ids().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>> {
        Ok(self.inner.lock().await.items.clone())
    }

    async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        Ok(self.inner.lock().await.groups.clone())
    }

    async fn list_exclusions(&self, scope: GroupId) -> StoreResult<Vec<Exclusion>> {
        let inner = self.inner.lock().await;
        inner.check_scope(scope)?;
        Ok(inner
            .exclusions
            .iter()
            .filter(|e| e.group_id == scope)
            .copied()
            .collect())
    }

    async fn add_exclusions(&self, scope: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.check_scope(scope)?;
        for &item_id in item_ids {
            let exclusion = Exclusion {
                group_id: scope,
                item_id,
            };
            if !inner.exclusions.contains(&exclusion) {
                inner.exclusions.push(exclusion);
            }
        }
        inner.record(format!("add_exclusions({}, {})", scope, item_ids.len()));
        Ok(())
    }

    async fn remove_exclusions(&self, scope: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.check_scope(scope)?;
        let removed: HashSet<ItemId> = item_ids.iter().copied().collect();
        inner
            .exclusions
            .retain(|e| e.group_id != scope || !removed.contains(&e.item_id));
        inner.record(format!("remove_exclusions({}, {})", scope, item_ids.len()));
        Ok(())
    }

    async fn list_divisions(&self) -> StoreResult<Vec<Division>> {
        Ok(self.inner.lock().await.divisions.clone())
    }

    async fn create_group(&self, id: GroupId, name: &str, item_ids: &[ItemId]) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let wanted = name.trim().to_lowercase();
        let clash = inner
            .groups
            .iter()
            .any(|g| g.is_explicit() && g.id != Some(id) && g.name.trim().to_lowercase() == wanted);
        if clash {
            return Err(StoreError::Rejected {
                status: 409,
                message: format!("group name '{}' already exists", name),
            });
        }

        let pos = match inner.groups.iter().position(|g| g.id == Some(id)) {
            Some(_) => {
                let pos = inner.explicit_index(id)?;
                let group = &mut inner.groups[pos];
                group.name = name.to_string();
                group.members.clear();
                pos
            }
            None => {
                inner.groups.push(Group::explicit(id, name));
                inner.groups.len() - 1
            }
        };
        inner.append(pos, item_ids);
        inner.record(format!("create_group({}, {})", id, item_ids.len()));
        Ok(())
    }

    async fn append_items(&self, group_id: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let pos = inner.explicit_index(group_id)?;
        inner.append(pos, item_ids);
        inner.record(format!("append_items({}, {})", group_id, item_ids.len()));
        Ok(())
    }

    async fn remove_items(&self, group_id: GroupId, item_ids: &[ItemId]) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let pos = inner.explicit_index(group_id)?;
        let removed: HashSet<ItemId> = item_ids.iter().copied().collect();
        inner.groups[pos]
            .members
            .retain(|m| !removed.contains(&m.item_id));
        inner.record(format!("remove_items({}, {})", group_id, item_ids.len()));
        Ok(())
    }

    async fn move_items(
        &self,
        from_group_id: GroupId,
        to_group_id: GroupId,
        item_ids: &[ItemId],
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let from = inner.explicit_index(from_group_id)?;
        let to = inner.explicit_index(to_group_id)?;
        let moved: HashSet<ItemId> = item_ids.iter().copied().collect();
        // Ids already gone from the source still land in the destination.
        inner.groups[from]
            .members
            .retain(|m| !moved.contains(&m.item_id));
        inner.append(to, item_ids);
        inner.record(format!(
            "move_items({}, {}, {})",
            from_group_id,
            to_group_id,
            item_ids.len()
        ));
        Ok(())
    }
}
