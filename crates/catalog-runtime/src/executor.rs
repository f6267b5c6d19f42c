use catalog_types::{GroupId, GroupKind, GroupsSnapshot, ItemId, MutationAction};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::operation::Operation;
use crate::store::{GroupStore, StoreError};

/// One logical store request, before chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateGroup {
        id: GroupId,
        name: String,
        item_ids: Vec<ItemId>,
    },
    AppendItems {
        group_id: GroupId,
        item_ids: Vec<ItemId>,
    },
    RemoveItems {
        group_id: GroupId,
        item_ids: Vec<ItemId>,
    },
    MoveItems {
        from_group_id: GroupId,
        to_group_id: GroupId,
        item_ids: Vec<ItemId>,
    },
    AddExclusions {
        scope: GroupId,
        item_ids: Vec<ItemId>,
    },
    RemoveExclusions {
        scope: GroupId,
        item_ids: Vec<ItemId>,
    },
}

impl StoreCall {
    pub fn item_ids(&self) -> &[ItemId] {
        match self {
            StoreCall::CreateGroup { item_ids, .. }
            | StoreCall::AppendItems { item_ids, .. }
            | StoreCall::RemoveItems { item_ids, .. }
            | StoreCall::MoveItems { item_ids, .. }
            | StoreCall::AddExclusions { item_ids, .. }
            | StoreCall::RemoveExclusions { item_ids, .. } => item_ids,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreCall::CreateGroup { .. } => "create_group",
            StoreCall::AppendItems { .. } => "append_items",
            StoreCall::RemoveItems { .. } => "remove_items",
            StoreCall::MoveItems { .. } => "move_items",
            StoreCall::AddExclusions { .. } => "add_exclusions",
            StoreCall::RemoveExclusions { .. } => "remove_exclusions",
        }
    }

    /// Send one chunk. Chunks after the first of a group creation append to
    /// the group the first chunk created.
    async fn send<S>(&self, store: &S, index: usize, chunk: &[ItemId]) -> Result<(), StoreError>
    where
        S: GroupStore + ?Sized,
    {
        match self {
            StoreCall::CreateGroup { id, name, .. } if index == 0 => {
                store.create_group(*id, name, chunk).await
            }
            StoreCall::CreateGroup { id, .. } => store.append_items(*id, chunk).await,
            StoreCall::AppendItems { group_id, .. } => store.append_items(*group_id, chunk).await,
            StoreCall::RemoveItems { group_id, .. } => store.remove_items(*group_id, chunk).await,
            StoreCall::MoveItems {
                from_group_id,
                to_group_id,
                ..
            } => store.move_items(*from_group_id, *to_group_id, chunk).await,
            StoreCall::AddExclusions { scope, .. } => store.add_exclusions(*scope, chunk).await,
            StoreCall::RemoveExclusions { scope, .. } => {
                store.remove_exclusions(*scope, chunk).await
            }
        }
    }
}

fn unassign_plan(item_ids: &[ItemId], groups: &GroupsSnapshot) -> Vec<StoreCall> {
    let wanted: HashSet<ItemId> = item_ids.iter().copied().collect();
    let mut calls: Vec<StoreCall> = groups
        .explicit_groups()
        .filter_map(|group| {
            let group_id = group.id?;
            let owned: Vec<ItemId> = group.member_ids().filter(|id| wanted.contains(id)).collect();
            (!owned.is_empty()).then_some(StoreCall::RemoveItems {
                group_id,
                item_ids: owned,
            })
        })
        .collect();
    if let Some(scope) = groups.unassigned_backing() {
        calls.push(StoreCall::RemoveExclusions {
            scope,
            item_ids: item_ids.to_vec(),
        });
    }
    calls
}

/// Translate an operation into store calls against the snapshot it was
/// issued on.
///
/// Placing items in Unassigned becomes one removal per owning explicit group
/// plus an exclusion removal. Moving out of a derived group is an append: the
/// store detaches appended items from wherever they were.
pub fn plan(op: &Operation, groups: &GroupsSnapshot) -> Vec<StoreCall> {
    let kind_of = |id: GroupId| groups.find(id).map(|g| g.kind);

    match op {
        Operation::Mutation(MutationAction::CreateGroup { id, name, item_ids }) => {
            vec![StoreCall::CreateGroup {
                id: *id,
                name: name.clone(),
                item_ids: item_ids.clone(),
            }]
        }
        Operation::Mutation(MutationAction::AppendItems { group_id, item_ids }) => {
            match kind_of(*group_id) {
                Some(GroupKind::Unassigned) => unassign_plan(item_ids, groups),
                _ => vec![StoreCall::AppendItems {
                    group_id: *group_id,
                    item_ids: item_ids.clone(),
                }],
            }
        }
        Operation::Mutation(MutationAction::RemoveItems { group_id, item_ids }) => {
            vec![StoreCall::RemoveItems {
                group_id: *group_id,
                item_ids: item_ids.clone(),
            }]
        }
        Operation::Mutation(MutationAction::MoveItems {
            from_group_id,
            to_group_id,
            item_ids,
        }) => match (kind_of(*from_group_id), kind_of(*to_group_id)) {
            (_, Some(GroupKind::Unassigned)) => unassign_plan(item_ids, groups),
            (Some(GroupKind::Explicit), _) => vec![StoreCall::MoveItems {
                from_group_id: *from_group_id,
                to_group_id: *to_group_id,
                item_ids: item_ids.clone(),
            }],
            _ => vec![StoreCall::AppendItems {
                group_id: *to_group_id,
                item_ids: item_ids.clone(),
            }],
        },
        Operation::Exclude { item_ids } => groups
            .unassigned_backing()
            .map(|scope| StoreCall::AddExclusions {
                scope,
                item_ids: item_ids.clone(),
            })
            .into_iter()
            .collect(),
        Operation::Include { item_ids } => groups
            .unassigned_backing()
            .map(|scope| StoreCall::RemoveExclusions {
                scope,
                item_ids: item_ids.clone(),
            })
            .into_iter()
            .collect(),
        Operation::Unassign { item_ids } => unassign_plan(item_ids, groups),
    }
}

/// Outcome of sending a plan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionReport {
    /// Distinct ids whose every request was acknowledged.
    pub succeeded_count: usize,
    /// Ids of the failed chunk and of everything not yet sent, in plan order.
    pub failed_ids: Vec<ItemId>,
    pub chunks_sent: usize,
    pub error: Option<StoreError>,
}

impl ExecutionReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Send a plan in sequential chunks of at most `batch_size` ids, stopping at
/// the first failure.
pub async fn execute<S>(store: &S, calls: &[StoreCall], batch_size: usize) -> ExecutionReport
where
    S: GroupStore + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut report = ExecutionReport::default();
    let mut failed: Vec<ItemId> = Vec::new();

    'calls: for (call_index, call) in calls.iter().enumerate() {
        let ids = call.item_ids();
        // An empty group creation is still one request.
        let chunks: Vec<&[ItemId]> = if ids.is_empty() {
            vec![ids]
        } else {
            ids.chunks(batch_size).collect()
        };
        let total = chunks.len();

        for (index, chunk) in chunks.into_iter().enumerate() {
            match call.send(store, index, chunk).await {
                Ok(()) => {
                    report.chunks_sent += 1;
                    debug!(
                        call = call.name(),
                        chunk = index + 1,
                        of = total,
                        size = chunk.len(),
                        "chunk acknowledged"
                    );
                }
                Err(err) => {
                    warn!(
                        call = call.name(),
                        chunk = index + 1,
                        of = total,
                        error = %err,
                        "chunk failed; skipping the rest of the plan"
                    );
                    let sent = index * batch_size;
                    failed.extend_from_slice(&ids[sent.min(ids.len())..]);
                    for later in &calls[call_index + 1..] {
                        failed.extend_from_slice(later.item_ids());
                    }
                    report.error = Some(err);
                    break 'calls;
                }
            }
        }
    }

    let mut seen = HashSet::new();
    failed.retain(|id| seen.insert(*id));
    let all: HashSet<ItemId> = calls
        .iter()
        .flat_map(|call| call.item_ids().iter().copied())
        .collect();
    report.succeeded_count = all.len() - seen.len();
    report.failed_ids = failed;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_types::{Group, Revision};

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    fn groups() -> GroupsSnapshot {
        GroupsSnapshot::new(
            Revision::confirmed(1),
            vec![
                Group::unassigned_backing(GroupId::new(100), "Sin asignar"),
                Group::explicit(GroupId::new(1), "Bebidas").with_members(ids(&[10, 11])),
                Group::explicit(GroupId::new(2), "Snacks").with_members(ids(&[12])),
            ],
        )
    }

    #[test]
    fn test_move_to_unassigned_plans_removals() {
        let op = Operation::from(MutationAction::MoveItems {
            from_group_id: GroupId::new(1),
            to_group_id: GroupId::new(100),
            item_ids: ids(&[10, 12, 13]),
        });
        assert_eq!(
            plan(&op, &groups()),
            vec![
                StoreCall::RemoveItems {
                    group_id: GroupId::new(1),
                    item_ids: ids(&[10]),
                },
                StoreCall::RemoveItems {
                    group_id: GroupId::new(2),
                    item_ids: ids(&[12]),
                },
                StoreCall::RemoveExclusions {
                    scope: GroupId::new(100),
                    item_ids: ids(&[10, 12, 13]),
                },
            ]
        );
    }

    #[test]
    fn test_move_from_derived_group_is_append() {
        let op = Operation::from(MutationAction::MoveItems {
            from_group_id: GroupId::new(100),
            to_group_id: GroupId::new(2),
            item_ids: ids(&[13]),
        });
        assert_eq!(
            plan(&op, &groups()),
            vec![StoreCall::AppendItems {
                group_id: GroupId::new(2),
                item_ids: ids(&[13]),
            }]
        );
    }

    #[test]
    fn test_exclusion_plans_use_backing_scope() {
        let op = Operation::Exclude {
            item_ids: ids(&[13]),
        };
        assert_eq!(
            plan(&op, &groups()),
            vec![StoreCall::AddExclusions {
                scope: GroupId::new(100),
                item_ids: ids(&[13]),
            }]
        );
    }
}
