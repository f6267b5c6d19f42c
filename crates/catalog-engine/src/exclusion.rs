use catalog_types::{ExclusionSet, ItemId};
use std::sync::Arc;

/// Answers membership in the exclusion set backing the Unassigned group.
///
/// Knows nothing about groups. Mutations are copy-on-write: the shared
/// [`ExclusionSet`] is only cloned when an add/remove actually changes it, so
/// the snapshot identity stays stable across no-op calls.
#[derive(Debug, Clone, Default)]
pub struct ExclusionResolver {
    set: Arc<ExclusionSet>,
}

impl ExclusionResolver {
    pub fn new(set: ExclusionSet) -> Self {
        Self { set: Arc::new(set) }
    }

    pub fn from_shared(set: Arc<ExclusionSet>) -> Self {
        Self { set }
    }

    pub fn is_excluded(&self, item_id: ItemId) -> bool {
        self.set.contains(item_id)
    }

    /// Returns how many ids were newly excluded. Already-excluded ids are skipped.
    pub fn add_exclusions(&mut self, item_ids: &[ItemId]) -> usize {
        let fresh: Vec<ItemId> = item_ids
            .iter()
            .copied()
            .filter(|id| !self.set.contains(*id))
            .collect();
        if fresh.is_empty() {
            return 0;
        }
        let set = Arc::make_mut(&mut self.set);
        fresh.into_iter().filter(|id| set.item_ids.insert(*id)).count()
    }

    /// Returns how many ids were removed. Removing a non-excluded id is a no-op.
    pub fn remove_exclusions(&mut self, item_ids: &[ItemId]) -> usize {
        if !item_ids.iter().any(|id| self.set.contains(*id)) {
            return 0;
        }
        let set = Arc::make_mut(&mut self.set);
        item_ids.iter().filter(|id| set.item_ids.remove(*id)).count()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Shared handle to the current set; pointer identity changes only on real edits.
    pub fn snapshot(&self) -> Arc<ExclusionSet> {
        Arc::clone(&self.set)
    }
}
