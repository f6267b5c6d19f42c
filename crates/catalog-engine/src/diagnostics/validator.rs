use catalog_types::{Catalog, ExclusionSet, GroupId, GroupsSnapshot, ItemId};
use std::collections::{BTreeMap, HashMap};

/// How much attention a diagnostic deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Category of a diagnostic, used to group similar findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    DuplicateMembership,
    DuplicateGroupName,
    UnknownItem,
    ShadowedExclusion,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::DuplicateMembership => write!(f, "duplicate_membership"),
            DiagnosticKind::DuplicateGroupName => write!(f, "duplicate_group_name"),
            DiagnosticKind::UnknownItem => write!(f, "unknown_item"),
            DiagnosticKind::ShadowedExclusion => write!(f, "shadowed_exclusion"),
        }
    }
}

/// One invariant violation (or suspicious condition) found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Item listed by more than one explicit group. Rows render it under the first.
    DuplicateMembership {
        item_id: ItemId,
        groups: Vec<GroupId>,
    },
    /// Explicit group names collide case-insensitively.
    DuplicateGroupName { name: String, groups: Vec<GroupId> },
    /// Group member with no catalog row.
    UnknownItem { group_id: GroupId, item_id: ItemId },
    /// Excluded item that is explicitly grouped; the exclusion has no effect.
    ShadowedExclusion { item_id: ItemId, group_id: GroupId },
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::DuplicateMembership { .. } => DiagnosticKind::DuplicateMembership,
            Diagnostic::DuplicateGroupName { .. } => DiagnosticKind::DuplicateGroupName,
            Diagnostic::UnknownItem { .. } => DiagnosticKind::UnknownItem,
            Diagnostic::ShadowedExclusion { .. } => DiagnosticKind::ShadowedExclusion,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::DuplicateMembership { .. } | Diagnostic::DuplicateGroupName { .. } => {
                Severity::Error
            }
            Diagnostic::UnknownItem { .. } => Severity::Warning,
            Diagnostic::ShadowedExclusion { .. } => Severity::Info,
        }
    }
}

fn join_ids(groups: &[GroupId]) -> String {
    groups
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DuplicateMembership { item_id, groups } => {
                write!(f, "item {} is listed by groups [{}]", item_id, join_ids(groups))
            }
            Diagnostic::DuplicateGroupName { name, groups } => {
                write!(f, "group name '{}' is used by [{}]", name, join_ids(groups))
            }
            Diagnostic::UnknownItem { group_id, item_id } => {
                write!(f, "group {} lists unknown item {}", group_id, item_id)
            }
            Diagnostic::ShadowedExclusion { item_id, group_id } => write!(
                f,
                "item {} is excluded but already grouped in {}",
                item_id, group_id
            ),
        }
    }
}

/// Check a snapshot against the partition invariants.
///
/// Findings are ordered by kind, then by the ids involved, so output is stable.
pub fn validate(
    catalog: &Catalog,
    groups: &GroupsSnapshot,
    exclusions: &ExclusionSet,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let mut owners: BTreeMap<ItemId, Vec<GroupId>> = BTreeMap::new();
    let mut names: BTreeMap<String, (String, Vec<GroupId>)> = BTreeMap::new();

    for group in groups.explicit_groups() {
        let Some(group_id) = group.id else { continue };

        names
            .entry(group.name.trim().to_lowercase())
            .or_insert_with(|| (group.name.clone(), Vec::new()))
            .1
            .push(group_id);

        for item_id in group.member_ids() {
            let listed = owners.entry(item_id).or_default();
            // A group listing the same id twice is still one membership.
            if !listed.contains(&group_id) {
                listed.push(group_id);
            }
            if !catalog.contains(item_id) {
                diagnostics.push(Diagnostic::UnknownItem { group_id, item_id });
            }
        }
    }

    for (item_id, groups) in &owners {
        if groups.len() > 1 {
            diagnostics.push(Diagnostic::DuplicateMembership {
                item_id: *item_id,
                groups: groups.clone(),
            });
        }
    }

    for (name, groups) in names.into_values() {
        if groups.len() > 1 {
            diagnostics.push(Diagnostic::DuplicateGroupName { name, groups });
        }
    }

    for item_id in &exclusions.item_ids {
        if let Some(group_id) = owners.get(item_id).and_then(|g| g.first()) {
            diagnostics.push(Diagnostic::ShadowedExclusion {
                item_id: *item_id,
                group_id: *group_id,
            });
        }
    }

    diagnostics.sort_by_key(Diagnostic::kind);
    diagnostics
}

/// Count findings per kind.
pub fn count_by_kind(diagnostics: &[Diagnostic]) -> HashMap<DiagnosticKind, usize> {
    let mut counts = HashMap::new();
    for diagnostic in diagnostics {
        *counts.entry(diagnostic.kind()).or_insert(0) += 1;
    }
    counts
}
