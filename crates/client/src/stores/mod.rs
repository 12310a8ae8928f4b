//! In-memory stores, one per server resource.
//!
//! A store owns its slice of state exclusively: views read through the
//! store's getters and mutate only through its operations. All state is
//! memory-only and rebuilt from the server on each process start.
//!
//! Every operation follows the same shape: mark loading and clear the
//! previous error, await the resource client, then apply the outcome to
//! state - clearing the loading flag on both paths - and propagate the
//! typed error to the caller.

mod cart;
mod catalog;
mod category;
mod dashboard;
mod inventory;
mod order;
mod review;
mod session;

pub use cart::CartStore;
pub use catalog::CatalogStore;
pub use category::{CategoryStore, flatten_categories};
pub use dashboard::DashboardStore;
pub use inventory::InventoryStore;
pub use order::OrderStore;
pub use review::ReviewStore;
pub use session::SessionStore;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError, Transport};
use crate::config::ClientConfig;
use crate::events::EventBus;

/// Monotonic fetch tokens for fetch-and-replace slots.
///
/// Each fetch takes a fresh token before suspending; when the response
/// arrives, it is applied only if its token is still the latest issued.
/// Stale responses - however late they resolve - are discarded, so the
/// last *issued* request wins rather than the last *resolved* one.
#[derive(Debug, Default)]
pub(crate) struct RequestSeq(AtomicU64);

impl RequestSeq {
    pub(crate) fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn is_current(&self, token: u64) -> bool {
        self.0.load(Ordering::Relaxed) == token
    }
}

/// Poison-recovering read lock. State is plain data; a panicked writer
/// cannot leave it logically torn.
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Poison-recovering write lock.
pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// The full set of stores, constructed together around one resource
/// client and one event bus.
///
/// This is the explicit provider boundary: an embedder builds one
/// `Stores`, hands the individual stores to its views, and optionally
/// spawns the event pumps that carry the cross-store subscriptions.
/// Tests build isolated instances over a mock transport.
pub struct Stores {
    api: ApiClient,
    events: EventBus,
    session: Arc<SessionStore>,
    catalog: Arc<CatalogStore>,
    category: Arc<CategoryStore>,
    cart: Arc<CartStore>,
    order: Arc<OrderStore>,
    inventory: Arc<InventoryStore>,
    review: Arc<ReviewStore>,
    dashboard: Arc<DashboardStore>,
}

impl Stores {
    /// Build the store set over the real HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::from_api(ApiClient::new(config)?))
    }

    /// Build the store set over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self::from_api(ApiClient::with_transport(transport))
    }

    fn from_api(api: ApiClient) -> Self {
        let events = EventBus::new();
        Self {
            session: Arc::new(SessionStore::new(api.clone(), events.clone())),
            catalog: Arc::new(CatalogStore::new(api.clone())),
            category: Arc::new(CategoryStore::new(api.clone())),
            cart: Arc::new(CartStore::new(api.clone())),
            order: Arc::new(OrderStore::new(api.clone())),
            inventory: Arc::new(InventoryStore::new(api.clone(), events.clone())),
            review: Arc::new(ReviewStore::new(api.clone())),
            dashboard: Arc::new(DashboardStore::new(api.clone())),
            api,
            events,
        }
    }

    /// Register the hook the resource client fires on an unexpected 401
    /// (session expiry). The embedding UI navigates to its login screen
    /// here.
    pub fn set_session_expired_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.api.set_session_expired_hook(hook);
    }

    /// The bus carrying cross-store events.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    #[must_use]
    pub fn category(&self) -> &Arc<CategoryStore> {
        &self.category
    }

    #[must_use]
    pub fn cart(&self) -> &Arc<CartStore> {
        &self.cart
    }

    #[must_use]
    pub fn order(&self) -> &Arc<OrderStore> {
        &self.order
    }

    #[must_use]
    pub fn inventory(&self) -> &Arc<InventoryStore> {
        &self.inventory
    }

    #[must_use]
    pub fn review(&self) -> &Arc<ReviewStore> {
        &self.review
    }

    #[must_use]
    pub fn dashboard(&self) -> &Arc<DashboardStore> {
        &self.dashboard
    }

    /// Spawn the event pumps for the stores that subscribe to the bus.
    ///
    /// Tests usually skip this and call the stores' `handle_event`
    /// directly for deterministic ordering.
    pub fn spawn_event_pumps(&self) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(Arc::clone(&self.cart).run(self.events.subscribe())),
            tokio::spawn(Arc::clone(&self.catalog).run(self.events.subscribe())),
            tokio::spawn(Arc::clone(&self.order).run(self.events.subscribe())),
        ]
    }
}
