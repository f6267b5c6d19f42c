use catalog_types::{
    Catalog, Group, GroupId, GroupKind, GroupMember, GroupsSnapshot, ItemAttributes, ItemId,
    MutationAction,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Source of display attributes joined onto bare item ids.
pub trait AttributeLookup {
    fn attributes(&self, item_id: ItemId) -> Option<ItemAttributes>;
}

impl AttributeLookup for Catalog {
    fn attributes(&self, item_id: ItemId) -> Option<ItemAttributes> {
        self.get(item_id).map(|item| item.attributes())
    }
}

impl AttributeLookup for HashMap<ItemId, ItemAttributes> {
    fn attributes(&self, item_id: ItemId) -> Option<ItemAttributes> {
        self.get(&item_id).cloned()
    }
}

/// Lookup that knows nothing; every member gets placeholder display values.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttributes;

impl AttributeLookup for NoAttributes {
    fn attributes(&self, _item_id: ItemId) -> Option<ItemAttributes> {
        None
    }
}

impl<T: AttributeLookup + ?Sized> AttributeLookup for &T {
    fn attributes(&self, item_id: ItemId) -> Option<ItemAttributes> {
        (**self).attributes(item_id)
    }
}

impl<T: AttributeLookup + ?Sized> AttributeLookup for Arc<T> {
    fn attributes(&self, item_id: ItemId) -> Option<ItemAttributes> {
        (**self).attributes(item_id)
    }
}

/// How an action's group id resolves inside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Explicit(usize),
    /// Backing id of the derived Unassigned group.
    Unassigned,
    /// Stored Discontinued representation; membership follows item status.
    Inert,
}

fn resolve(snapshot: &GroupsSnapshot, id: GroupId) -> Option<Target> {
    let pos = snapshot.groups.iter().position(|g| g.id == Some(id))?;
    Some(match snapshot.groups[pos].kind {
        GroupKind::Explicit => Target::Explicit(pos),
        GroupKind::Unassigned => Target::Unassigned,
        GroupKind::Discontinued => Target::Inert,
    })
}

/// Apply one optimistic action, producing a new snapshot.
///
/// Total: never fails. When the action changes nothing (unknown destination,
/// removing absent ids, targeting the Discontinued representation) the input
/// `Arc` is returned as-is, so identity-keyed caches stay warm. Otherwise the
/// result is a copy-on-write fork with a bumped local revision.
pub fn apply<L>(
    snapshot: &Arc<GroupsSnapshot>,
    action: &MutationAction,
    lookup: &L,
) -> Arc<GroupsSnapshot>
where
    L: AttributeLookup + ?Sized,
{
    let mut groups = snapshot.groups.clone();

    let changed = match action {
        MutationAction::CreateGroup { id, name, item_ids } => {
            create_group(&mut groups, snapshot, *id, name, item_ids, lookup)
        }
        MutationAction::AppendItems { group_id, item_ids } => {
            match resolve(snapshot, *group_id) {
                Some(target) => append(&mut groups, target, item_ids, lookup),
                None => false,
            }
        }
        MutationAction::RemoveItems { group_id, item_ids } => {
            match resolve(snapshot, *group_id) {
                Some(Target::Explicit(pos)) => remove_from(&mut groups[pos], &id_set(item_ids)),
                _ => false,
            }
        }
        MutationAction::MoveItems {
            from_group_id,
            to_group_id,
            item_ids,
        } => match resolve(snapshot, *to_group_id) {
            // Nothing moves unless the destination can receive the ids.
            Some(Target::Inert) | None => false,
            Some(to) => {
                let removed = match resolve(snapshot, *from_group_id) {
                    Some(Target::Explicit(pos)) => {
                        remove_from(&mut groups[pos], &id_set(item_ids))
                    }
                    _ => false,
                };
                let appended = append(&mut groups, to, item_ids, lookup);
                removed || appended
            }
        },
    };

    if !changed {
        return Arc::clone(snapshot);
    }

    let next = GroupsSnapshot::new(snapshot.revision.fork(), groups);
    debug!(
        action = action.name(),
        from = %snapshot.revision,
        to = %next.revision,
        "applied optimistic action"
    );
    Arc::new(next)
}

/// Fold a sequence of actions, in order.
pub fn apply_all<'a, L>(
    snapshot: &Arc<GroupsSnapshot>,
    actions: impl IntoIterator<Item = &'a MutationAction>,
    lookup: &L,
) -> Arc<GroupsSnapshot>
where
    L: AttributeLookup + ?Sized,
{
    actions
        .into_iter()
        .fold(Arc::clone(snapshot), |acc, action| apply(&acc, action, lookup))
}

fn create_group<L>(
    groups: &mut Vec<Group>,
    snapshot: &GroupsSnapshot,
    id: GroupId,
    name: &str,
    item_ids: &[ItemId],
    lookup: &L,
) -> bool
where
    L: AttributeLookup + ?Sized,
{
    let mut group = Group::explicit(id, name);
    let pos = match resolve(snapshot, id) {
        Some(Target::Explicit(pos)) => {
            group.division_id = groups[pos].division_id;
            groups[pos] = group;
            pos
        }
        // Backing groups are never replaced by an explicit one.
        Some(Target::Unassigned) | Some(Target::Inert) => return false,
        None => {
            groups.push(group);
            groups.len() - 1
        }
    };
    append_members(&mut groups[pos], item_ids, lookup);
    detach(groups, &id_set(item_ids), Some(pos));
    true
}

fn append<L>(groups: &mut [Group], target: Target, item_ids: &[ItemId], lookup: &L) -> bool
where
    L: AttributeLookup + ?Sized,
{
    match target {
        Target::Explicit(pos) => {
            let appended = append_members(&mut groups[pos], item_ids, lookup);
            let detached = detach(groups, &id_set(item_ids), Some(pos));
            appended || detached
        }
        // Placing an item in Unassigned means it leaves every explicit group.
        Target::Unassigned => detach(groups, &id_set(item_ids), None),
        Target::Inert => false,
    }
}

/// Merge ids into a group's ordered member list. Existing members keep their
/// attributes unless the lookup offers strictly richer ones.
fn append_members<L>(group: &mut Group, item_ids: &[ItemId], lookup: &L) -> bool
where
    L: AttributeLookup + ?Sized,
{
    let mut positions: HashMap<ItemId, usize> = group
        .members
        .iter()
        .enumerate()
        .map(|(pos, m)| (m.item_id, pos))
        .collect();
    let mut changed = false;

    for &item_id in item_ids {
        let attributes = lookup.attributes(item_id);
        match positions.get(&item_id) {
            Some(&pos) => {
                if let Some(attributes) = attributes {
                    let member = &mut group.members[pos];
                    if attributes.richness() > member.attributes().richness() {
                        *member = GroupMember::with_attributes(item_id, attributes);
                        changed = true;
                    }
                }
            }
            None => {
                positions.insert(item_id, group.members.len());
                group.members.push(match attributes {
                    Some(attributes) => GroupMember::with_attributes(item_id, attributes),
                    None => GroupMember::bare(item_id),
                });
                changed = true;
            }
        }
    }
    changed
}

fn remove_from(group: &mut Group, item_ids: &HashSet<ItemId>) -> bool {
    let before = group.members.len();
    group.members.retain(|m| !item_ids.contains(&m.item_id));
    group.members.len() != before
}

fn detach(groups: &mut [Group], item_ids: &HashSet<ItemId>, keep: Option<usize>) -> bool {
    let mut changed = false;
    for (pos, group) in groups.iter_mut().enumerate() {
        if Some(pos) != keep && group.is_explicit() {
            changed |= remove_from(group, item_ids);
        }
    }
    changed
}

fn id_set(item_ids: &[ItemId]) -> HashSet<ItemId> {
    item_ids.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_types::{CatalogItem, Revision};

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    fn members(snapshot: &GroupsSnapshot, id: u64) -> Vec<ItemId> {
        snapshot
            .find(GroupId::new(id))
            .map(|g| g.member_ids().collect())
            .unwrap_or_default()
    }

    fn bebidas() -> Arc<GroupsSnapshot> {
        Arc::new(GroupsSnapshot::new(
            Revision::confirmed(1),
            vec![
                Group::unassigned_backing(GroupId::new(100), "Sin asignar"),
                Group::explicit(GroupId::new(1), "Bebidas").with_members(ids(&[10, 11])),
                Group::explicit(GroupId::new(2), "Snacks"),
            ],
        ))
    }

    #[test]
    fn move_is_atomic() {
        let snapshot = bebidas();
        let next = apply(
            &snapshot,
            &MutationAction::MoveItems {
                from_group_id: GroupId::new(1),
                to_group_id: GroupId::new(2),
                item_ids: ids(&[10]),
            },
            &NoAttributes,
        );

        assert_eq!(members(&next, 1), ids(&[11]));
        assert_eq!(members(&next, 2), ids(&[10]));
        assert_eq!(next.revision, Revision::confirmed(1).fork());
        // Input snapshot is untouched.
        assert_eq!(members(&snapshot, 1), ids(&[10, 11]));
    }

    #[test]
    fn move_to_unknown_destination_changes_nothing() {
        let snapshot = bebidas();
        let next = apply(
            &snapshot,
            &MutationAction::MoveItems {
                from_group_id: GroupId::new(1),
                to_group_id: GroupId::new(99),
                item_ids: ids(&[10]),
            },
            &NoAttributes,
        );
        assert!(Arc::ptr_eq(&snapshot, &next));
    }

    #[test]
    fn remove_is_idempotent() {
        let snapshot = bebidas();
        let action = MutationAction::RemoveItems {
            group_id: GroupId::new(1),
            item_ids: ids(&[11, 42]),
        };

        let once = apply(&snapshot, &action, &NoAttributes);
        let twice = apply(&once, &action, &NoAttributes);

        assert_eq!(members(&once, 1), ids(&[10]));
        assert!(Arc::ptr_eq(&once, &twice));
    }

    #[test]
    fn append_detaches_from_other_groups() {
        let snapshot = bebidas();
        let next = apply(
            &snapshot,
            &MutationAction::AppendItems {
                group_id: GroupId::new(2),
                item_ids: ids(&[11, 12, 12]),
            },
            &NoAttributes,
        );

        assert_eq!(members(&next, 1), ids(&[10]));
        assert_eq!(members(&next, 2), ids(&[11, 12]));
    }

    #[test]
    fn append_keeps_richer_attributes() {
        let catalog = Catalog::new(vec![
            CatalogItem::active(10u64).with_name("Agua").with_rubro("BEB"),
        ]);
        let snapshot = apply(
            &bebidas(),
            &MutationAction::AppendItems {
                group_id: GroupId::new(2),
                item_ids: ids(&[10]),
            },
            &catalog,
        );
        let enriched = snapshot.find(GroupId::new(2)).unwrap().members[0].clone();
        assert_eq!(enriched.display_name.as_deref(), Some("Agua"));

        // Re-appending with no known attributes must not wipe them.
        let again = apply(
            &snapshot,
            &MutationAction::AppendItems {
                group_id: GroupId::new(2),
                item_ids: ids(&[10]),
            },
            &NoAttributes,
        );
        assert!(Arc::ptr_eq(&snapshot, &again));
    }

    #[test]
    fn create_group_uses_placeholders_when_unknown() {
        let next = apply(
            &bebidas(),
            &MutationAction::CreateGroup {
                id: GroupId::new(3),
                name: "Lácteos".to_string(),
                item_ids: ids(&[77]),
            },
            &NoAttributes,
        );
        let group = next.find(GroupId::new(3)).unwrap();
        assert_eq!(group.name, "Lácteos");
        assert_eq!(group.members[0].label(), "#77");
        assert_eq!(group.members[0].category_or("Sin categoría"), "Sin categoría");
    }

    #[test]
    fn create_group_replaces_existing() {
        let next = apply(
            &bebidas(),
            &MutationAction::CreateGroup {
                id: GroupId::new(1),
                name: "Bebidas frías".to_string(),
                item_ids: ids(&[12]),
            },
            &NoAttributes,
        );
        assert_eq!(next.groups.len(), 3);
        assert_eq!(next.find(GroupId::new(1)).unwrap().name, "Bebidas frías");
        assert_eq!(members(&next, 1), ids(&[12]));
    }

    #[test]
    fn append_to_unassigned_backing_detaches_everywhere() {
        let next = apply(
            &bebidas(),
            &MutationAction::MoveItems {
                from_group_id: GroupId::new(1),
                to_group_id: GroupId::new(100),
                item_ids: ids(&[10, 11]),
            },
            &NoAttributes,
        );
        assert!(members(&next, 1).is_empty());
        assert!(members(&next, 100).is_empty());
    }

    #[test]
    fn discontinued_representation_is_inert() {
        let snapshot = Arc::new(GroupsSnapshot::new(
            Revision::confirmed(1),
            vec![Group::discontinued_backing(GroupId::new(101), "Discontinuados")],
        ));
        let next = apply(
            &snapshot,
            &MutationAction::AppendItems {
                group_id: GroupId::new(101),
                item_ids: ids(&[1]),
            },
            &NoAttributes,
        );
        assert!(Arc::ptr_eq(&snapshot, &next));
    }

    #[test]
    fn apply_all_folds_in_order() {
        let actions = vec![
            MutationAction::AppendItems {
                group_id: GroupId::new(2),
                item_ids: ids(&[12]),
            },
            MutationAction::MoveItems {
                from_group_id: GroupId::new(2),
                to_group_id: GroupId::new(1),
                item_ids: ids(&[12]),
            },
        ];
        let next = apply_all(&bebidas(), &actions, &NoAttributes);
        assert_eq!(members(&next, 1), ids(&[10, 11, 12]));
        assert!(members(&next, 2).is_empty());
        assert_eq!(next.revision.local, 2);
    }
}
