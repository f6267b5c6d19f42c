use catalog_types::{DivisionScope, GroupSelector, ItemId, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::cache::{PartitionCache, PartitionSources};
use crate::division::{VisibleGroup, is_visible, visible_groups};
use crate::partition::Membership;

/// Display strings for the derived groups and missing attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub unassigned: String,
    pub discontinued: String,
    pub placeholder_category: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            unassigned: "Sin asignar".to_string(),
            discontinued: "Discontinuados".to_string(),
            placeholder_category: "Sin categoría".to_string(),
        }
    }
}

impl Labels {
    pub fn group_label<'a>(&'a self, group: &VisibleGroup<'a>) -> &'a str {
        match group {
            VisibleGroup::Explicit { group, .. } => &group.name,
            VisibleGroup::Unassigned => &self.unassigned,
            VisibleGroup::Discontinued => &self.discontinued,
        }
    }
}

struct Section<'a> {
    selector: GroupSelector,
    label: &'a str,
    item_ids: Vec<ItemId>,
}

impl Section<'_> {
    fn rank(&self) -> u8 {
        match self.selector {
            GroupSelector::Explicit(_) => 0,
            GroupSelector::Unassigned => 1,
            GroupSelector::Discontinued => 2,
        }
    }
}

/// Flatten visible groups into header and item rows.
///
/// Explicit groups come first, sorted by name case-insensitively, then
/// Unassigned, then Discontinued. Derived groups with no members are omitted.
/// An item listed by two explicit groups is rendered once, under the group
/// that comes first in snapshot order.
pub fn build_rows<F>(groups: &[VisibleGroup<'_>], labels: &Labels, mut membership: F) -> Vec<Row>
where
    F: FnMut(GroupSelector) -> Arc<Membership>,
{
    let mut seen: HashSet<ItemId> = HashSet::new();
    let mut sections: Vec<Section<'_>> = Vec::with_capacity(groups.len());

    for group in groups {
        let selector = group.selector();
        let members = membership(selector);
        let item_ids: Vec<ItemId> = match group {
            VisibleGroup::Explicit { .. } => members
                .ids()
                .iter()
                .copied()
                .filter(|id| seen.insert(*id))
                .collect(),
            VisibleGroup::Unassigned | VisibleGroup::Discontinued => {
                if members.is_empty() {
                    continue;
                }
                members.ids().to_vec()
            }
        };
        sections.push(Section {
            selector,
            label: labels.group_label(group),
            item_ids,
        });
    }

    // Stable: equal names keep snapshot order.
    sections.sort_by_cached_key(|s| (s.rank(), s.label.to_lowercase()));

    let total = sections.iter().map(|s| s.item_ids.len() + 1).sum();
    let mut rows = Vec::with_capacity(total);
    for section in sections {
        rows.push(Row::Header {
            group: section.selector,
            group_label: section.label.to_string(),
            count: section.item_ids.len(),
        });
        rows.extend(section.item_ids.into_iter().map(|item_id| Row::Item {
            group: section.selector,
            item_id,
        }));
    }
    rows
}

/// Rows shown for a selection inside a division scope.
///
/// `None` renders every visible group. `Some(selector)` renders that group's
/// header and items, or nothing when the group is not visible in `scope`.
pub fn visible_rows(
    cache: &mut PartitionCache,
    sources: &PartitionSources,
    scope: &DivisionScope,
    selected: Option<GroupSelector>,
    labels: &Labels,
) -> Vec<Row> {
    let visible = visible_groups(&sources.groups, scope);
    let rows = match selected {
        None => build_rows(&visible, labels, |selector| cache.membership(sources, selector)),
        Some(selector) if is_visible(&sources.groups, scope, selector) => {
            let group = visible.iter().find(|g| g.selector() == selector);
            match group {
                Some(group) => {
                    let members = cache.membership(sources, selector);
                    let mut rows = Vec::with_capacity(members.len() + 1);
                    rows.push(Row::Header {
                        group: selector,
                        group_label: labels.group_label(group).to_string(),
                        count: members.len(),
                    });
                    rows.extend(members.ids().iter().map(|&item_id| Row::Item {
                        group: selector,
                        item_id,
                    }));
                    rows
                }
                None => Vec::new(),
            }
        }
        Some(_) => Vec::new(),
    };
    debug!(
        ?selected,
        division = ?scope.division_id,
        rows = rows.len(),
        revision = %sources.groups.revision,
        "built visible rows"
    );
    rows
}
