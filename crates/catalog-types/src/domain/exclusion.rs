use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ids::{GroupId, ItemId};

/// Presence means "this active item is intentionally not shown as Unassigned".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exclusion {
    /// Backing id of the Unassigned group that scopes the exclusion.
    pub group_id: GroupId,
    pub item_id: ItemId,
}

/// Exclusion ids for one Unassigned scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet {
    pub backing_group: Option<GroupId>,
    pub item_ids: BTreeSet<ItemId>,
}

impl ExclusionSet {
    pub fn new(backing_group: Option<GroupId>) -> Self {
        Self {
            backing_group,
            item_ids: BTreeSet::new(),
        }
    }

    /// Collect exclusions listed for `backing_group`, ignoring rows scoped elsewhere.
    pub fn from_exclusions(
        backing_group: Option<GroupId>,
        exclusions: impl IntoIterator<Item = Exclusion>,
    ) -> Self {
        let item_ids = exclusions
            .into_iter()
            .filter(|e| backing_group.is_none_or(|id| e.group_id == id))
            .map(|e| e.item_id)
            .collect();
        Self {
            backing_group,
            item_ids,
        }
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.item_ids.contains(&item_id)
    }

    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }
}
