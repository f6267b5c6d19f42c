use catalog_engine::PartitionSources;
use catalog_types::{DivisionId, DivisionScope, ItemId, ViewMode};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::config::Config;
use crate::events::{CatalogEvent, EventBus};
use crate::executor::{ExecutionReport, execute};
use crate::loader::load;
use crate::operation::Operation;
use crate::state::{CatalogState, Completion, PendingOperation};
use crate::store::GroupStore;
use crate::{Error, Result};

/// How a dispatched operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Committed,
    /// Some chunks were acknowledged before one failed. With `refetched` the
    /// display is server truth; without it the refetch failed and the display
    /// is the last confirmed snapshot, missing the acknowledged chunks.
    Partial {
        succeeded_count: usize,
        failed_ids: Vec<ItemId>,
        refetched: bool,
    },
    /// Nothing reached the store; the display reverted to confirmed state.
    RolledBack { reason: String, retryable: bool },
    /// The scope changed while the operation was in flight.
    Stale,
}

impl DispatchOutcome {
    pub fn committed(&self) -> bool {
        matches!(self, DispatchOutcome::Committed)
    }
}

/// Owns the catalog state for one business and drives operations through the
/// store: optimistic apply, chunked send, forced refetch.
pub struct CatalogRuntime<S: GroupStore> {
    store: Arc<S>,
    state: CatalogState,
    config: Config,
    events: EventBus,
    scope: DivisionScope,
}

impl<S: GroupStore> CatalogRuntime<S> {
    /// Load the catalog and start in the main division scope.
    pub async fn connect(store: Arc<S>, config: Config) -> Result<Self> {
        let loaded = load(store.as_ref()).await?;
        info!(
            items = loaded.items.len(),
            groups = loaded.groups.len(),
            "catalog runtime connected"
        );
        Ok(Self {
            state: CatalogState::new(loaded, config.view_mode),
            store,
            config,
            events: EventBus::new(),
            scope: DivisionScope::main(),
        })
    }

    /// Apply, send and reconcile one operation.
    ///
    /// Only validation failures are errors; store failures are reported in
    /// the outcome after the display has been reconciled.
    pub async fn dispatch(&mut self, operation: Operation) -> Result<DispatchOutcome> {
        let pending = self.begin(operation)?;
        let store = Arc::clone(&self.store);
        let report = execute(store.as_ref(), &pending.plan, self.config.batch_size()).await;
        Ok(self.finish(&pending, report).await)
    }

    /// Validate and optimistically apply without sending.
    ///
    /// Pair with [`execute`] on [`CatalogRuntime::store`] and
    /// [`CatalogRuntime::finish`] to keep several operations in flight.
    pub fn begin(&mut self, operation: Operation) -> Result<PendingOperation> {
        let pending = self.state.begin(operation)?;
        self.emit_groups_replaced();
        Ok(pending)
    }

    /// Resolve an operation from its execution report.
    pub async fn finish(
        &mut self,
        pending: &PendingOperation,
        report: ExecutionReport,
    ) -> DispatchOutcome {
        match self.state.complete(pending.id) {
            Completion::Current => {}
            Completion::Stale | Completion::Unknown => {
                self.events.emit(CatalogEvent::StaleResultDiscarded {
                    operation: pending.id,
                });
                // Server truth still replaces the display; the result itself is ignored.
                if let Err(err) = self.refresh().await {
                    warn!(operation = %pending.id, error = %err, "refetch after stale completion failed");
                    self.events.emit(CatalogEvent::RefetchFailed {
                        operation: pending.id,
                        reason: err.to_string(),
                    });
                }
                return DispatchOutcome::Stale;
            }
        }

        let outcome = match report.error {
            None => DispatchOutcome::Committed,
            Some(err) if report.chunks_sent == 0 => {
                self.state.rollback();
                self.emit_groups_replaced();
                let reason = err.to_string();
                let retryable = err.is_retryable();
                self.events.emit(CatalogEvent::MutationRolledBack {
                    operation: pending.id,
                    reason: reason.clone(),
                    retryable,
                });
                return DispatchOutcome::RolledBack { reason, retryable };
            }
            Some(_) => DispatchOutcome::Partial {
                succeeded_count: report.succeeded_count,
                failed_ids: report.failed_ids,
                refetched: true,
            },
        };

        // The store acknowledged at least one chunk, so the operation is
        // reported as such even when server truth cannot be fetched.
        let outcome = match self.refresh().await {
            Ok(_) => outcome,
            Err(err) => {
                warn!(operation = %pending.id, error = %err, "forced refetch failed");
                self.events.emit(CatalogEvent::RefetchFailed {
                    operation: pending.id,
                    reason: err.to_string(),
                });
                match outcome {
                    DispatchOutcome::Partial {
                        succeeded_count,
                        failed_ids,
                        ..
                    } => {
                        self.state.rollback();
                        self.emit_groups_replaced();
                        DispatchOutcome::Partial {
                            succeeded_count,
                            failed_ids,
                            refetched: false,
                        }
                    }
                    // Fully acknowledged: the optimistic display already
                    // matches the store.
                    other => other,
                }
            }
        };

        match &outcome {
            DispatchOutcome::Committed => {
                self.events.emit(CatalogEvent::MutationCommitted {
                    operation: pending.id,
                });
            }
            DispatchOutcome::Partial {
                succeeded_count,
                failed_ids,
                refetched,
            } => {
                warn!(
                    operation = %pending.id,
                    succeeded = succeeded_count,
                    failed = failed_ids.len(),
                    refetched,
                    "bulk operation partially applied"
                );
                self.events.emit(CatalogEvent::MutationPartial {
                    operation: pending.id,
                    succeeded_count: *succeeded_count,
                    failed_ids: failed_ids.clone(),
                });
            }
            DispatchOutcome::RolledBack { .. } | DispatchOutcome::Stale => {}
        }
        outcome
    }

    /// Refetch and adopt server truth. Returns `false` when a later refetch
    /// had already been adopted.
    pub async fn refresh(&mut self) -> Result<bool> {
        let ticket = self.state.begin_fetch();
        let loaded = load(self.store.as_ref()).await?;
        let adopted = self.state.adopt(ticket, loaded);
        if adopted {
            self.emit_groups_replaced();
        }
        Ok(adopted)
    }

    /// Switch the division scope. In-flight operations become stale.
    pub fn switch_division(&mut self, division_id: Option<DivisionId>) -> Result<&DivisionScope> {
        let scope = self.state.division_scope(division_id).ok_or_else(|| {
            Error::InvalidOperation(format!(
                "unknown division {}",
                division_id.map(|id| id.to_string()).unwrap_or_default()
            ))
        })?;
        self.scope = scope;
        self.state.switch_scope();
        self.events.emit(CatalogEvent::ScopeChanged { division_id });
        self.emit_groups_replaced();
        Ok(&self.scope)
    }

    /// Selecting a different group also invalidates in-flight results.
    pub fn switch_group(&mut self) {
        self.state.switch_scope();
        self.emit_groups_replaced();
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.state.set_view_mode(view_mode);
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<CatalogEvent> {
        self.events.subscribe()
    }

    pub fn emit(&mut self, event: CatalogEvent) {
        self.events.emit(event);
    }

    pub fn sources(&self) -> PartitionSources {
        self.state.sources()
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn scope(&self) -> &DivisionScope {
        &self.scope
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn emit_groups_replaced(&mut self) {
        let revision = self.state.current().revision;
        self.events.emit(CatalogEvent::GroupsReplaced { revision });
    }
}
