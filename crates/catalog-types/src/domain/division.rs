use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ids::{DivisionId, GroupId};

/// Division as returned by the division listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: DivisionId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub visible_group_ids: BTreeSet<GroupId>,
}

/// Restricts which explicit groups are surfaced. Unassigned and Discontinued
/// are visible in every scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionScope {
    /// `None` is the main (root) scope.
    pub division_id: Option<DivisionId>,
    #[serde(default)]
    pub visible_group_ids: BTreeSet<GroupId>,
}

impl DivisionScope {
    pub fn main() -> Self {
        Self::default()
    }

    pub fn for_division(division: &Division) -> Self {
        Self {
            division_id: Some(division.id),
            visible_group_ids: division.visible_group_ids.clone(),
        }
    }

    pub fn is_main(&self) -> bool {
        self.division_id.is_none()
    }
}

impl From<&Division> for DivisionScope {
    fn from(division: &Division) -> Self {
        Self::for_division(division)
    }
}
