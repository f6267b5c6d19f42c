use serde::{Deserialize, Serialize};

use crate::{GroupSelector, ItemId};

/// One line of the flattened, grouped list handed to the window renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Row {
    Header {
        group: GroupSelector,
        group_label: String,
        count: usize,
    },
    Item {
        group: GroupSelector,
        item_id: ItemId,
    },
}

impl Row {
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            Row::Item { item_id, .. } => Some(*item_id),
            Row::Header { .. } => None,
        }
    }

    pub fn group(&self) -> GroupSelector {
        match self {
            Row::Header { group, .. } | Row::Item { group, .. } => *group,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, Row::Header { .. })
    }
}
