//! Cross-store event bus.
//!
//! Stores never reach into each other directly. The two documented
//! couplings - the cart following the session lifecycle, and the catalog
//! refreshing a product whose stock changed - travel as broadcast events
//! any interested store subscribes to.

use inkbound_core::ProductId;
use tokio::sync::broadcast;
use tracing::debug;

/// Events published between stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A user logged in or an existing session was found.
    SessionStarted,
    /// The user logged out; session-scoped state must be dropped.
    SessionEnded,
    /// A product's stock figure changed outside the catalog store.
    ProductStockChanged { product_id: ProductId },
}

/// Broadcast bus connecting the stores.
///
/// Publishing never blocks and never fails; events sent while nobody is
/// subscribed are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    const CAPACITY: usize = 64;

    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    /// Subscribe to all events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: StoreEvent) {
        debug!(?event, "publishing store event");
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
