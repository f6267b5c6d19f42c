use serde::{Deserialize, Serialize};

use crate::{GroupId, ItemId};

/// Speculative edit applied locally before the store confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationAction {
    CreateGroup {
        id: GroupId,
        name: String,
        item_ids: Vec<ItemId>,
    },
    AppendItems {
        group_id: GroupId,
        item_ids: Vec<ItemId>,
    },
    RemoveItems {
        group_id: GroupId,
        item_ids: Vec<ItemId>,
    },
    MoveItems {
        from_group_id: GroupId,
        to_group_id: GroupId,
        item_ids: Vec<ItemId>,
    },
}

impl MutationAction {
    pub fn item_ids(&self) -> &[ItemId] {
        match self {
            MutationAction::CreateGroup { item_ids, .. }
            | MutationAction::AppendItems { item_ids, .. }
            | MutationAction::RemoveItems { item_ids, .. }
            | MutationAction::MoveItems { item_ids, .. } => item_ids,
        }
    }

    /// Group whose membership grows or shrinks last.
    pub fn target_group(&self) -> GroupId {
        match self {
            MutationAction::CreateGroup { id, .. } => *id,
            MutationAction::AppendItems { group_id, .. }
            | MutationAction::RemoveItems { group_id, .. } => *group_id,
            MutationAction::MoveItems { to_group_id, .. } => *to_group_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MutationAction::CreateGroup { .. } => "create_group",
            MutationAction::AppendItems { .. } => "append_items",
            MutationAction::RemoveItems { .. } => "remove_items",
            MutationAction::MoveItems { .. } => "move_items",
        }
    }
}
