//! Custom assertions for partition invariants.
//!
//! Provides high-level assertions that make tests more readable:
//! - Single explicit membership per item
//! - Unassigned as the exact complement of grouped and excluded items
//! - Group membership checks by raw id

use anyhow::{Context, Result};
use catalog_engine::PartitionSources;
use catalog_types::{GroupId, GroupSelector, GroupsSnapshot, ItemId};
use std::collections::{BTreeSet, HashMap};

/// Assert that no item is listed by two explicit groups.
pub fn assert_partition_exclusive(groups: &GroupsSnapshot) -> Result<()> {
    let mut owner: HashMap<ItemId, GroupId> = HashMap::new();
    for group in groups.explicit_groups() {
        let group_id = group.id.context("explicit group without id")?;
        for item_id in group.member_ids() {
            if let Some(previous) = owner.insert(item_id, group_id)
                && previous != group_id
            {
                anyhow::bail!(
                    "Item {} is a member of groups {} and {}",
                    item_id,
                    previous,
                    group_id
                );
            }
        }
    }
    Ok(())
}

/// Assert that Unassigned holds exactly the active items that are neither
/// explicitly grouped nor excluded.
pub fn assert_unassigned_complete(sources: &PartitionSources) -> Result<()> {
    let grouped = catalog_engine::grouped_item_ids(&sources.groups);
    let expected: BTreeSet<ItemId> = sources
        .catalog
        .iter()
        .filter(|item| item.status_active)
        .map(|item| item.id)
        .filter(|id| !grouped.contains(id) && !sources.exclusions.contains(*id))
        .collect();

    let actual: BTreeSet<ItemId> = sources
        .inputs()
        .membership(GroupSelector::Unassigned)
        .ids()
        .iter()
        .copied()
        .collect();

    if actual != expected {
        let missing: Vec<_> = expected.difference(&actual).collect();
        let extra: Vec<_> = actual.difference(&expected).collect();
        anyhow::bail!(
            "Unassigned mismatch: missing {:?}, unexpected {:?}",
            missing,
            extra
        );
    }
    Ok(())
}

/// Assert the exact member ids of an explicit group, in order.
pub fn assert_members(groups: &GroupsSnapshot, group_id: u64, expected: &[u64]) -> Result<()> {
    let group = groups
        .find(GroupId::new(group_id))
        .with_context(|| format!("Group {} not found in snapshot", group_id))?;
    let actual: Vec<u64> = group.member_ids().map(ItemId::get).collect();

    if actual != expected {
        anyhow::bail!(
            "Group {} members: expected {:?}, got {:?}",
            group_id,
            expected,
            actual
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_types::{Group, Revision};

    #[test]
    fn test_duplicate_membership_is_reported() {
        let groups = GroupsSnapshot::new(
            Revision::confirmed(1),
            vec![
                Group::explicit(GroupId::new(1), "A").with_members([ItemId::new(5)]),
                Group::explicit(GroupId::new(2), "B").with_members([ItemId::new(5)]),
            ],
        );
        let err = assert_partition_exclusive(&groups).unwrap_err();
        assert!(err.to_string().contains("groups 1 and 2"));
    }

    #[test]
    fn test_assert_members() {
        let groups = GroupsSnapshot::new(
            Revision::confirmed(1),
            vec![Group::explicit(GroupId::new(1), "A").with_members([ItemId::new(5)])],
        );
        assert!(assert_members(&groups, 1, &[5]).is_ok());
        assert!(assert_members(&groups, 1, &[]).is_err());
        assert!(assert_members(&groups, 2, &[5]).is_err());
    }
}
