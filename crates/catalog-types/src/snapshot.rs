use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    BusinessId, Catalog, CatalogItem, Division, Exclusion, ExclusionSet, Group, GroupsSnapshot,
    Result, Revision,
};

/// Everything the inbound listings return for one business, in one document.
///
/// Used for fixtures, the debug tool and seeding in-memory stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<BusinessId>,
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub divisions: Vec<Division>,
}

impl CatalogSnapshot {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.items.iter().cloned())
    }

    pub fn groups_snapshot(&self) -> GroupsSnapshot {
        GroupsSnapshot::new(Revision::confirmed(self.revision), self.groups.clone())
    }

    pub fn exclusion_set(&self) -> ExclusionSet {
        let backing = self.groups_snapshot().unassigned_backing();
        ExclusionSet::from_exclusions(backing, self.exclusions.iter().copied())
    }
}
