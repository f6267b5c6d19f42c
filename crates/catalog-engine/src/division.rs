use catalog_types::{DivisionScope, Group, GroupId, GroupSelector, GroupsSnapshot};

/// A group surfaced by a division scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisibleGroup<'a> {
    Explicit { id: GroupId, group: &'a Group },
    Unassigned,
    Discontinued,
}

impl VisibleGroup<'_> {
    pub fn selector(&self) -> GroupSelector {
        match self {
            VisibleGroup::Explicit { id, .. } => GroupSelector::Explicit(*id),
            VisibleGroup::Unassigned => GroupSelector::Unassigned,
            VisibleGroup::Discontinued => GroupSelector::Discontinued,
        }
    }
}

fn in_scope(group: &Group, scope: &DivisionScope) -> bool {
    match (scope.division_id, group.id) {
        (None, _) => group.division_id.is_none(),
        (Some(_), Some(id)) => scope.visible_group_ids.contains(&id),
        (Some(_), None) => false,
    }
}

/// Groups visible under `scope`: explicit groups in snapshot order, then the
/// two derived groups, which every scope shows.
///
/// Borrows from `groups`; the snapshot itself is never touched.
pub fn visible_groups<'a>(groups: &'a GroupsSnapshot, scope: &DivisionScope) -> Vec<VisibleGroup<'a>> {
    groups
        .explicit_groups()
        .filter(|group| in_scope(group, scope))
        .filter_map(|group| group.id.map(|id| VisibleGroup::Explicit { id, group }))
        .chain([VisibleGroup::Unassigned, VisibleGroup::Discontinued])
        .collect()
}

/// Whether a selector is reachable from `scope`.
pub fn is_visible(groups: &GroupsSnapshot, scope: &DivisionScope, selector: GroupSelector) -> bool {
    match selector {
        GroupSelector::Explicit(id) => groups
            .find(id)
            .is_some_and(|group| group.is_explicit() && in_scope(group, scope)),
        GroupSelector::Unassigned | GroupSelector::Discontinued => true,
    }
}
