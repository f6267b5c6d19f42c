use catalog_types::{GroupId, GroupKind, GroupsSnapshot, MutationAction};
use std::fmt;

use crate::operation::Operation;

/// Reasons an operation is rejected before it reaches the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No item ids were selected.
    EmptySelection,
    /// The destination exists but cannot receive items.
    MissingDestination(GroupId),
    /// The group id is not in the current snapshot.
    UnknownGroup(GroupId),
    EmptyGroupName,
    SameSourceAndDestination,
    /// Exclusions need an Unassigned backing group to scope them.
    NoExclusionScope,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptySelection => write!(f, "no items selected"),
            ValidationError::MissingDestination(id) => {
                write!(f, "group {} cannot receive items", id)
            }
            ValidationError::UnknownGroup(id) => write!(f, "unknown group {}", id),
            ValidationError::EmptyGroupName => write!(f, "group name is empty"),
            ValidationError::SameSourceAndDestination => {
                write!(f, "source and destination are the same group")
            }
            ValidationError::NoExclusionScope => {
                write!(f, "catalog has no Unassigned backing group for exclusions")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn receiving_group(groups: &GroupsSnapshot, id: GroupId) -> Result<(), ValidationError> {
    match groups.find(id).map(|g| g.kind) {
        None => Err(ValidationError::UnknownGroup(id)),
        Some(GroupKind::Discontinued) => Err(ValidationError::MissingDestination(id)),
        Some(GroupKind::Explicit | GroupKind::Unassigned) => Ok(()),
    }
}

/// Reject malformed operations against the current snapshot.
///
/// `CreateGroup` may carry no items: an empty group is a valid thing to create.
pub fn validate(op: &Operation, groups: &GroupsSnapshot) -> Result<(), ValidationError> {
    if !matches!(op, Operation::Mutation(MutationAction::CreateGroup { .. }))
        && op.item_ids().is_empty()
    {
        return Err(ValidationError::EmptySelection);
    }

    match op {
        Operation::Mutation(MutationAction::CreateGroup { id, name, .. }) => {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyGroupName);
            }
            match groups.find(*id).map(|g| g.kind) {
                Some(GroupKind::Unassigned | GroupKind::Discontinued) => {
                    Err(ValidationError::MissingDestination(*id))
                }
                _ => Ok(()),
            }
        }
        Operation::Mutation(MutationAction::AppendItems { group_id, .. }) => {
            receiving_group(groups, *group_id)
        }
        Operation::Mutation(MutationAction::RemoveItems { group_id, .. }) => {
            match groups.find(*group_id) {
                Some(group) if group.is_explicit() => Ok(()),
                _ => Err(ValidationError::UnknownGroup(*group_id)),
            }
        }
        Operation::Mutation(MutationAction::MoveItems {
            from_group_id,
            to_group_id,
            ..
        }) => {
            if from_group_id == to_group_id {
                return Err(ValidationError::SameSourceAndDestination);
            }
            if groups.find(*from_group_id).is_none() {
                return Err(ValidationError::UnknownGroup(*from_group_id));
            }
            receiving_group(groups, *to_group_id)
        }
        Operation::Exclude { .. } | Operation::Include { .. } => {
            match groups.unassigned_backing() {
                Some(_) => Ok(()),
                None => Err(ValidationError::NoExclusionScope),
            }
        }
        Operation::Unassign { .. } => Ok(()),
    }
}
