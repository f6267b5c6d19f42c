use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use tokio::sync::mpsc::UnboundedReceiver;

// Re-export event types for convenient use in client code
pub use catalog_runtime::CatalogEvent;

/// Typed catalog notifications as an async stream.
pub struct EventStream {
    receiver: UnboundedReceiver<CatalogEvent>,
}

impl EventStream {
    pub(crate) fn new(receiver: UnboundedReceiver<CatalogEvent>) -> Self {
        Self { receiver }
    }

    /// Poll for the next event (non-blocking).
    ///
    /// Returns `None` if no event is available immediately.
    pub fn try_next(&mut self) -> Option<CatalogEvent> {
        self.receiver.try_recv().ok()
    }

    /// Everything delivered so far, without waiting.
    pub fn drain(&mut self) -> Vec<CatalogEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

impl Stream for EventStream {
    type Item = CatalogEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
