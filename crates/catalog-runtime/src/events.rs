use catalog_types::{DivisionId, ItemId, OperationId, Revision};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Typed notification for UI collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    /// The displayed group snapshot changed (optimistic fork or adopted refetch).
    GroupsReplaced { revision: Revision },
    VisibleItemsChanged { item_ids: Vec<ItemId> },
    MutationCommitted { operation: OperationId },
    /// Some chunks of a bulk operation failed.
    MutationPartial {
        operation: OperationId,
        succeeded_count: usize,
        failed_ids: Vec<ItemId>,
    },
    /// Display reverted to server truth. `retryable` drives the retry affordance.
    MutationRolledBack {
        operation: OperationId,
        reason: String,
        retryable: bool,
    },
    /// The refetch after an operation failed. The display is not server
    /// truth until a later refresh succeeds.
    RefetchFailed { operation: OperationId, reason: String },
    /// Completion arrived after a division or group switch and was ignored.
    StaleResultDiscarded { operation: OperationId },
    ScopeChanged { division_id: Option<DivisionId> },
}

/// Fan-out of [`CatalogEvent`]s to every live subscriber.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<UnboundedSender<CatalogEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<CatalogEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver to every subscriber, dropping the ones whose receiver is gone.
    pub fn emit(&mut self, event: CatalogEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
