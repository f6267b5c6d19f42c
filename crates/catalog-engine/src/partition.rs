use catalog_types::{Catalog, ExclusionSet, Group, GroupSelector, GroupsSnapshot, ItemId, ViewMode};
use std::collections::HashSet;

/// Item ids belonging to one group, in display order, with O(1) lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    ids: Vec<ItemId>,
    lookup: HashSet<ItemId>,
}

impl Membership {
    fn from_ordered(ids: impl IntoIterator<Item = ItemId>) -> Self {
        let mut membership = Self::default();
        for id in ids {
            if membership.lookup.insert(id) {
                membership.ids.push(id);
            }
        }
        membership
    }

    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.lookup.contains(&item_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_set(&self) -> &HashSet<ItemId> {
        &self.lookup
    }
}

/// Everything a membership computation reads. Passed explicitly; nothing is
/// read from ambient state.
#[derive(Debug, Clone, Copy)]
pub struct PartitionInputs<'a> {
    pub catalog: &'a Catalog,
    pub groups: &'a GroupsSnapshot,
    pub exclusions: &'a ExclusionSet,
    pub view_mode: ViewMode,
}

impl<'a> PartitionInputs<'a> {
    pub fn new(
        catalog: &'a Catalog,
        groups: &'a GroupsSnapshot,
        exclusions: &'a ExclusionSet,
        view_mode: ViewMode,
    ) -> Self {
        Self {
            catalog,
            groups,
            exclusions,
            view_mode,
        }
    }

    /// Exact set of item ids belonging to `selector`.
    ///
    /// O(items + Σ group sizes). Pure: the same inputs always give the same output.
    pub fn membership(&self, selector: GroupSelector) -> Membership {
        match selector {
            GroupSelector::Explicit(id) => match self.groups.find(id) {
                Some(group) if group.is_explicit() => self.explicit_members(group),
                _ => Membership::default(),
            },
            GroupSelector::Unassigned => self.unassigned_members(),
            GroupSelector::Discontinued => self.discontinued_members(),
        }
    }

    fn explicit_members(&self, group: &Group) -> Membership {
        Membership::from_ordered(group.member_ids().filter(|&id| {
            self.catalog
                .is_active(id)
                .is_some_and(|active| self.view_mode.admits(active))
        }))
    }

    fn unassigned_members(&self) -> Membership {
        let grouped = grouped_item_ids(self.groups);
        Membership::from_ordered(
            self.catalog
                .iter()
                .filter(|item| item.status_active)
                .map(|item| item.id)
                // Explicit membership wins; exclusion only matters for ungrouped items.
                .filter(|id| !grouped.contains(id) && !self.exclusions.contains(*id)),
        )
    }

    fn discontinued_members(&self) -> Membership {
        let backing: Option<HashSet<ItemId>> = self
            .groups
            .discontinued_backing()
            .map(|group| group.member_ids().collect());

        Membership::from_ordered(
            self.catalog
                .iter()
                .filter(|item| !item.status_active)
                .map(|item| item.id)
                .filter(|id| backing.as_ref().is_none_or(|members| members.contains(id))),
        )
    }
}

/// Union of member ids over every explicit group.
pub fn grouped_item_ids(groups: &GroupsSnapshot) -> HashSet<ItemId> {
    groups
        .explicit_groups()
        .flat_map(|group| group.member_ids())
        .collect()
}

/// Façade over [`PartitionInputs::membership`].
pub fn compute_membership(
    selector: GroupSelector,
    catalog: &Catalog,
    groups: &GroupsSnapshot,
    exclusions: &ExclusionSet,
    view_mode: ViewMode,
) -> Membership {
    PartitionInputs::new(catalog, groups, exclusions, view_mode).membership(selector)
}
