use catalog_engine::{ExclusionResolver, PartitionSources, apply_action, apply_all};
use catalog_types::{
    Catalog, Division, DivisionId, DivisionScope, ExclusionSet, GroupKind, GroupsSnapshot,
    MutationAction, OperationId, Revision, ViewMode,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::executor::{StoreCall, plan};
use crate::loader::LoadedCatalog;
use crate::operation::{Operation, OperationIds};
use crate::validation::{ValidationError, validate};

/// An operation applied optimistically and not yet resolved by the store.
#[derive(Debug, Clone)]
pub struct PendingOperation {
    pub id: OperationId,
    /// Scope epoch the operation was issued in.
    pub epoch: u64,
    pub operation: Operation,
    /// Store calls computed against the snapshot the operation was issued on.
    pub plan: Vec<StoreCall>,
    pub issued_at: DateTime<Utc>,
}

/// How a completion relates to the current scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Current,
    /// Issued before a division or group switch; its result is ignored.
    Stale,
    /// Not pending (already completed, or never issued).
    Unknown,
}

/// Sequence number of a refetch. Later tickets win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Confirmed server state plus the optimistic view built on top of it.
///
/// The displayed snapshot is always `confirmed` with the pending operations of
/// the current epoch replayed in issue order. Refetches replace `confirmed`
/// wholesale; nothing is merged.
#[derive(Debug)]
pub struct CatalogState {
    catalog: Arc<Catalog>,
    confirmed: Arc<GroupsSnapshot>,
    confirmed_exclusions: Arc<ExclusionSet>,
    current: Arc<GroupsSnapshot>,
    exclusions: ExclusionResolver,
    divisions: Vec<Division>,
    pending: BTreeMap<OperationId, PendingOperation>,
    ids: OperationIds,
    epoch: u64,
    fetches_issued: u64,
    adopted_fetch: u64,
    view_mode: ViewMode,
}

impl CatalogState {
    /// Build from an initial load, which counts as the first refetch.
    pub fn new(loaded: LoadedCatalog, view_mode: ViewMode) -> Self {
        let confirmed = Arc::new(GroupsSnapshot::new(Revision::confirmed(1), loaded.groups));
        let confirmed_exclusions = Arc::new(loaded.exclusions);
        Self {
            catalog: Arc::new(Catalog::new(loaded.items)),
            current: Arc::clone(&confirmed),
            exclusions: ExclusionResolver::from_shared(Arc::clone(&confirmed_exclusions)),
            confirmed,
            confirmed_exclusions,
            divisions: loaded.divisions,
            pending: BTreeMap::new(),
            ids: OperationIds::default(),
            epoch: 0,
            fetches_issued: 1,
            adopted_fetch: 1,
            view_mode,
        }
    }

    /// Validate, record and optimistically apply an operation.
    pub fn begin(&mut self, operation: Operation) -> Result<PendingOperation, ValidationError> {
        validate(&operation, &self.current)?;

        let pending = PendingOperation {
            id: self.ids.next_id(),
            epoch: self.epoch,
            plan: plan(&operation, &self.current),
            operation,
            issued_at: Utc::now(),
        };
        self.current = apply_operation(
            &self.current,
            &mut self.exclusions,
            &pending.operation,
            &self.catalog,
        );
        self.pending.insert(pending.id, pending.clone());

        debug!(
            operation = %pending.id,
            kind = pending.operation.name(),
            items = pending.operation.item_ids().len(),
            revision = %self.current.revision,
            "operation applied optimistically"
        );
        Ok(pending)
    }

    /// Mark an operation resolved. The optimistic effect stays visible until
    /// the next refetch is adopted or the state is rolled back.
    pub fn complete(&mut self, id: OperationId) -> Completion {
        let Some(pending) = self.pending.remove(&id) else {
            return Completion::Unknown;
        };
        let elapsed_ms = (Utc::now() - pending.issued_at).num_milliseconds();
        if pending.epoch < self.epoch {
            info!(operation = %id, elapsed_ms, "stale completion discarded");
            Completion::Stale
        } else {
            debug!(operation = %id, elapsed_ms, "operation completed");
            Completion::Current
        }
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetches_issued += 1;
        FetchTicket(self.fetches_issued)
    }

    /// Replace confirmed state with a refetch result. Returns `false` when a
    /// later refetch was already adopted, in which case nothing changes.
    pub fn adopt(&mut self, ticket: FetchTicket, loaded: LoadedCatalog) -> bool {
        if ticket.0 <= self.adopted_fetch {
            debug!(
                fetch = ticket.0,
                adopted = self.adopted_fetch,
                "older refetch ignored"
            );
            return false;
        }
        self.adopted_fetch = ticket.0;
        self.catalog = Arc::new(Catalog::new(loaded.items));
        self.confirmed = Arc::new(GroupsSnapshot::new(
            Revision::confirmed(ticket.0),
            loaded.groups,
        ));
        self.confirmed_exclusions = Arc::new(loaded.exclusions);
        self.divisions = loaded.divisions;
        self.rebuild();
        debug!(
            revision = %self.current.revision,
            pending = self.pending.len(),
            fetched_at = %loaded.fetched_at,
            "refetch adopted"
        );
        true
    }

    /// Drop unconfirmed effects: back to confirmed state plus whatever is
    /// still in flight in the current epoch.
    pub fn rollback(&mut self) {
        warn!(revision = %self.confirmed.revision, "rolling back to confirmed snapshot");
        self.rebuild();
    }

    /// Start a new scope epoch (division or group switch). Operations issued
    /// earlier stop contributing to the displayed snapshot.
    pub fn switch_scope(&mut self) -> u64 {
        self.epoch += 1;
        self.rebuild();
        debug!(epoch = self.epoch, "scope epoch advanced");
        self.epoch
    }

    fn rebuild(&mut self) {
        let mut exclusions = ExclusionResolver::from_shared(Arc::clone(&self.confirmed_exclusions));
        let mut current = Arc::clone(&self.confirmed);
        for pending in self.pending.values().filter(|p| p.epoch == self.epoch) {
            current = apply_operation(&current, &mut exclusions, &pending.operation, &self.catalog);
        }
        self.current = current;
        self.exclusions = exclusions;
    }

    pub fn sources(&self) -> PartitionSources {
        PartitionSources::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.current),
            self.exclusions.snapshot(),
            self.view_mode,
        )
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn current(&self) -> &Arc<GroupsSnapshot> {
        &self.current
    }

    pub fn confirmed(&self) -> &Arc<GroupsSnapshot> {
        &self.confirmed
    }

    pub fn exclusions(&self) -> Arc<ExclusionSet> {
        self.exclusions.snapshot()
    }

    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    pub fn division_scope(&self, division_id: Option<DivisionId>) -> Option<DivisionScope> {
        match division_id {
            None => Some(DivisionScope::main()),
            Some(id) => self
                .divisions
                .iter()
                .find(|d| d.id == id)
                .map(DivisionScope::from),
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingOperation> {
        self.pending.values()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
    }
}

/// Apply one operation to the displayed groups and exclusions.
fn apply_operation(
    groups: &Arc<GroupsSnapshot>,
    exclusions: &mut ExclusionResolver,
    operation: &Operation,
    catalog: &Catalog,
) -> Arc<GroupsSnapshot> {
    match operation {
        Operation::Mutation(action) => {
            let into_unassigned = operation
                .destination()
                .and_then(|id| groups.find(id))
                .is_some_and(|g| g.kind == GroupKind::Unassigned);
            if into_unassigned {
                exclusions.remove_exclusions(action.item_ids());
            }
            apply_action(groups, action, catalog)
        }
        Operation::Exclude { item_ids } => {
            exclusions.add_exclusions(item_ids);
            Arc::clone(groups)
        }
        Operation::Include { item_ids } => {
            exclusions.remove_exclusions(item_ids);
            Arc::clone(groups)
        }
        Operation::Unassign { item_ids } => {
            exclusions.remove_exclusions(item_ids);
            let wanted: HashSet<_> = item_ids.iter().copied().collect();
            let removals: Vec<MutationAction> = groups
                .explicit_groups()
                .filter(|g| g.member_ids().any(|id| wanted.contains(&id)))
                .filter_map(|g| g.id)
                .map(|group_id| MutationAction::RemoveItems {
                    group_id,
                    item_ids: item_ids.clone(),
                })
                .collect();
            apply_all(groups, &removals, catalog)
        }
    }
}
