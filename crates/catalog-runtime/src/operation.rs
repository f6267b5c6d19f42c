use catalog_types::{GroupId, ItemId, MutationAction, OperationId};
use serde::{Deserialize, Serialize};

/// Anything the runtime can apply optimistically and then send to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Mutation(MutationAction),
    /// Hide active, ungrouped items from Unassigned.
    Exclude { item_ids: Vec<ItemId> },
    /// Undo [`Operation::Exclude`].
    Include { item_ids: Vec<ItemId> },
    /// Remove from every explicit group and from the exclusion set.
    Unassign { item_ids: Vec<ItemId> },
}

impl Operation {
    pub fn item_ids(&self) -> &[ItemId] {
        match self {
            Operation::Mutation(action) => action.item_ids(),
            Operation::Exclude { item_ids }
            | Operation::Include { item_ids }
            | Operation::Unassign { item_ids } => item_ids,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Mutation(action) => action.name(),
            Operation::Exclude { .. } => "exclude",
            Operation::Include { .. } => "include",
            Operation::Unassign { .. } => "unassign",
        }
    }

    /// Destination group, for actions that have one.
    pub fn destination(&self) -> Option<GroupId> {
        match self {
            Operation::Mutation(MutationAction::RemoveItems { .. }) => None,
            Operation::Mutation(action) => Some(action.target_group()),
            Operation::Exclude { .. } | Operation::Include { .. } | Operation::Unassign { .. } => {
                None
            }
        }
    }
}

impl From<MutationAction> for Operation {
    fn from(action: MutationAction) -> Self {
        Operation::Mutation(action)
    }
}

/// Issues strictly increasing operation ids.
#[derive(Debug, Clone, Default)]
pub struct OperationIds {
    last: u64,
}

impl OperationIds {
    pub fn next_id(&mut self) -> OperationId {
        self.last += 1;
        OperationId::new(self.last)
    }
}
