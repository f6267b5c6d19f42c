use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::ids::{DivisionId, GroupId, ItemId};
use super::item::ItemAttributes;

/// How a group's membership is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Named, server-persisted collection of item ids.
    Explicit,
    /// Derived: active items in no explicit group and not excluded.
    /// A stored group of this kind only supplies the exclusion scope id.
    Unassigned,
    /// Derived from item status. A stored group of this kind is the explicit
    /// representation some catalogs keep for API symmetry.
    Discontinued,
}

/// Item reference stored inside a group, with whatever display attributes were
/// known when it was added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub item_id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl GroupMember {
    pub fn bare(item_id: ItemId) -> Self {
        Self {
            item_id,
            display_name: None,
            category: None,
            price: None,
        }
    }

    pub fn with_attributes(item_id: ItemId, attributes: ItemAttributes) -> Self {
        Self {
            item_id,
            display_name: attributes.display_name,
            category: attributes.category,
            price: attributes.price,
        }
    }

    pub fn attributes(&self) -> ItemAttributes {
        ItemAttributes {
            display_name: self.display_name.clone(),
            category: self.category.clone(),
            price: self.price,
        }
    }

    /// Display name, or `#<id>` when unknown.
    pub fn label(&self) -> Cow<'_, str> {
        match &self.display_name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("#{}", self.item_id)),
        }
    }

    pub fn category_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.category.as_deref().unwrap_or(placeholder)
    }
}

/// A group as listed by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// `None` only for purely implicit groups that have no server backing.
    #[serde(default)]
    pub id: Option<GroupId>,
    pub name: String,
    pub kind: GroupKind,
    /// Division this group is assigned to; `None` means the main scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_id: Option<DivisionId>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

impl Group {
    pub fn explicit(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            kind: GroupKind::Explicit,
            division_id: None,
            members: Vec::new(),
        }
    }

    pub fn unassigned_backing(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Unassigned,
            ..Self::explicit(id, name)
        }
    }

    pub fn discontinued_backing(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Discontinued,
            ..Self::explicit(id, name)
        }
    }

    pub fn with_members(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.members.extend(ids.into_iter().map(GroupMember::bare));
        self
    }

    pub fn in_division(mut self, division_id: DivisionId) -> Self {
        self.division_id = Some(division_id);
        self
    }

    /// Explicit groups with a server id participate in the partition.
    pub fn is_explicit(&self) -> bool {
        self.kind == GroupKind::Explicit && self.id.is_some()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.members.iter().map(|m| m.item_id)
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.members.iter().any(|m| m.item_id == item_id)
    }
}

/// Monotonic snapshot revision. Server snapshots carry the store's revision;
/// optimistic forks bump the local counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Revision {
    pub server: u64,
    #[serde(default)]
    pub local: u64,
}

impl Revision {
    pub const fn confirmed(server: u64) -> Self {
        Self { server, local: 0 }
    }

    pub const fn fork(self) -> Self {
        Self {
            server: self.server,
            local: self.local + 1,
        }
    }

    pub const fn is_confirmed(self) -> bool {
        self.local == 0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.local == 0 {
            write!(f, "r{}", self.server)
        } else {
            write!(f, "r{}+{}", self.server, self.local)
        }
    }
}

/// Immutable view of every stored group at one point in time.
///
/// Created on catalog load, replaced wholesale on refetch and forked
/// copy-on-write for each optimistic action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupsSnapshot {
    pub revision: Revision,
    pub groups: Vec<Group>,
}

impl GroupsSnapshot {
    pub fn new(revision: Revision, groups: Vec<Group>) -> Self {
        Self { revision, groups }
    }

    pub fn find(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == Some(id))
    }

    pub fn find_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == Some(id))
    }

    pub fn explicit_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| g.is_explicit())
    }

    /// Id of the stored group backing the Unassigned exclusion scope.
    pub fn unassigned_backing(&self) -> Option<GroupId> {
        self.groups
            .iter()
            .find(|g| g.kind == GroupKind::Unassigned)
            .and_then(|g| g.id)
    }

    /// Stored group representing discontinuation explicitly, if the catalog has one.
    pub fn discontinued_backing(&self) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.kind == GroupKind::Discontinued && g.id.is_some())
    }

    /// First explicit group (in snapshot order) listing the item.
    pub fn group_of(&self, item_id: ItemId) -> Option<GroupId> {
        self.explicit_groups()
            .find(|g| g.contains(item_id))
            .and_then(|g| g.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    #[test]
    fn test_snapshot_lookups() {
        let snapshot = GroupsSnapshot::new(
            Revision::confirmed(3),
            vec![
                Group::unassigned_backing(GroupId::new(100), "Sin asignar"),
                Group::explicit(GroupId::new(1), "Bebidas").with_members(ids(&[10, 11])),
                Group::discontinued_backing(GroupId::new(101), "Discontinuados")
                    .with_members(ids(&[12])),
            ],
        );

        assert_eq!(snapshot.unassigned_backing(), Some(GroupId::new(100)));
        assert_eq!(
            snapshot.discontinued_backing().and_then(|g| g.id),
            Some(GroupId::new(101))
        );
        assert_eq!(snapshot.explicit_groups().count(), 1);
        assert_eq!(snapshot.group_of(ItemId::new(11)), Some(GroupId::new(1)));
        assert_eq!(snapshot.group_of(ItemId::new(12)), None);
    }

    #[test]
    fn test_revision_fork() {
        let base = Revision::confirmed(5);
        let forked = base.fork().fork();
        assert!(base.is_confirmed());
        assert!(!forked.is_confirmed());
        assert_eq!(forked.to_string(), "r5+2");
        assert!(forked > base);
    }

    #[test]
    fn test_member_label_placeholder() {
        let member = GroupMember::bare(ItemId::new(77));
        assert_eq!(member.label(), "#77");
        assert_eq!(member.category_or("Sin categoría"), "Sin categoría");
    }

    #[test]
    fn test_group_listing_json() {
        let group: Group = serde_json::from_str(
            r#"{"id": 1, "name": "Bebidas", "kind": "explicit", "members": [{"itemId": 10}, {"itemId": 11, "displayName": "Soda"}]}"#,
        )
        .unwrap();
        assert!(group.is_explicit());
        assert_eq!(group.member_ids().collect::<Vec<_>>(), ids(&[10, 11]));
        assert_eq!(group.division_id, None);
    }
}
