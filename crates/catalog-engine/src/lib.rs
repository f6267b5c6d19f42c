// Engine module - Pure partition logic (membership, optimistic reducer, windowing)
// This layer sits between the data model (types) and the orchestration runtime

pub mod cache;
pub mod diagnostics;
pub mod division;
pub mod exclusion;
pub mod partition;
pub mod reducer;
pub mod rows;
pub mod window;

pub use cache::{CacheStats, PartitionCache, PartitionSources};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use division::{VisibleGroup, is_visible, visible_groups};
pub use exclusion::ExclusionResolver;
pub use partition::{Membership, PartitionInputs, compute_membership, grouped_item_ids};
pub use reducer::{AttributeLookup, NoAttributes, apply_all};
pub use rows::{Labels, build_rows, visible_rows};
pub use window::{RowIndex, VirtualWindow, VisibleItemsTracker, WindowConfig, WindowRange};

use catalog_types::{Catalog, ExclusionSet, GroupsSnapshot, MutationAction};
use std::sync::Arc;

// Façade API - Stable public interface for the runtime layer

/// Apply one optimistic action to a snapshot (see [`reducer::apply`]).
pub fn apply_action<L>(
    snapshot: &Arc<GroupsSnapshot>,
    action: &MutationAction,
    lookup: &L,
) -> Arc<GroupsSnapshot>
where
    L: AttributeLookup + ?Sized,
{
    reducer::apply(snapshot, action, lookup)
}

/// Check a snapshot against the partition invariants.
pub fn validate(
    catalog: &Catalog,
    groups: &GroupsSnapshot,
    exclusions: &ExclusionSet,
) -> Vec<Diagnostic> {
    diagnostics::validate(catalog, groups, exclusions)
}
