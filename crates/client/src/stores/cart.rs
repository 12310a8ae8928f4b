//! Cart store: the shopping cart and its per-item mutation state.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use inkbound_core::{CartItemId, ProductId};
use tokio::sync::broadcast;

use crate::api::{ApiClient, ApiError};
use crate::events::StoreEvent;
use crate::types::Cart;

use super::{read_lock, write_lock};

#[derive(Debug, Default)]
struct CartState {
    cart: Option<Cart>,
    is_loading: bool,
    /// Item ids with a mutation in flight; each row disables only its
    /// own controls.
    updating_items: HashSet<CartItemId>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct CartBody {
    cart: Cart,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct QuantityBody {
    quantity: u32,
}

/// Owns the shopping cart.
///
/// The server is authoritative for every computed field, so each
/// mutation replaces the whole cart from the response; emptying the cart
/// is the one exception and clears the local item list directly.
/// `item_count` and `cart_total` are recomputed from the item list on
/// every read, never stored.
pub struct CartStore {
    api: ApiClient,
    state: RwLock<CartState>,
}

impl CartStore {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(CartState {
                // Loading until the first load settles (or the session
                // turns out to be anonymous).
                is_loading: true,
                ..CartState::default()
            }),
        }
    }

    /// Load the authenticated user's cart.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the cart slot is cleared on failure.
    #[instrument(skip(self))]
    pub async fn load_cart(&self) -> Result<(), ApiError> {
        self.begin();
        let result = self.api.get::<CartBody>("/cart").await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.cart = Some(body.cart);
                Ok(())
            }
            Err(err) => {
                state.cart = None;
                state.error = Some(err.message_or("Failed to load your cart."));
                Err(err)
            }
        }
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Propagates the rejection (e.g. insufficient stock) so the product
    /// page can show it inline.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        self.begin();
        let result = self
            .api
            .post::<CartBody, _>(
                "/cart/items",
                &AddItemBody {
                    product_id,
                    quantity,
                },
            )
            .await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.cart = Some(body.cart);
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Could not add item to cart."));
                Err(err)
            }
        }
    }

    /// Change the quantity of one cart line.
    ///
    /// Out-of-range quantities (below 1, above the snapshot's stock) are
    /// rejected locally without a request. While the call is in flight
    /// the item id sits in the updating set, so only that row's controls
    /// are disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for local rejections, otherwise
    /// the server's rejection.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        if let Err(message) = self.validate_quantity(item_id, quantity) {
            write_lock(&self.state).error = Some(message.clone());
            return Err(ApiError::Validation(message));
        }

        self.begin_item(item_id);
        let result = self
            .api
            .put::<CartBody, _>(&format!("/cart/items/{item_id}"), &QuantityBody { quantity })
            .await;

        let mut state = write_lock(&self.state);
        state.updating_items.remove(&item_id);
        match result {
            Ok(body) => {
                state.cart = Some(body.cart);
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to update item quantity."));
                Err(err)
            }
        }
    }

    /// Remove one line from the cart.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the message is recorded for the row.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_from_cart(&self, item_id: CartItemId) -> Result<(), ApiError> {
        self.begin_item(item_id);
        let result = self
            .api
            .delete::<CartBody>(&format!("/cart/items/{item_id}"))
            .await;

        let mut state = write_lock(&self.state);
        state.updating_items.remove(&item_id);
        match result {
            Ok(body) => {
                state.cart = Some(body.cart);
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Could not remove item from cart."));
                Err(err)
            }
        }
    }

    /// Empty the cart.
    ///
    /// The local item list is cleared as soon as the delete call
    /// succeeds, without waiting for a refetch - the clear cannot
    /// partially fail on the server.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the cart is left untouched on failure.
    #[instrument(skip(self))]
    pub async fn empty_cart(&self) -> Result<(), ApiError> {
        self.begin();
        let result = self.api.delete::<()>("/cart").await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(()) => {
                if let Some(cart) = &mut state.cart {
                    cart.items.clear();
                }
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to clear the cart."));
                Err(err)
            }
        }
    }

    fn validate_quantity(&self, item_id: CartItemId, quantity: u32) -> Result<(), String> {
        if quantity == 0 {
            return Err("Quantity must be at least 1.".to_owned());
        }
        let state = read_lock(&self.state);
        let item = state
            .cart
            .as_ref()
            .and_then(|cart| cart.items.iter().find(|item| item.id == item_id));
        match item {
            Some(item) if quantity > item.product.stock => Err(format!(
                "Only {} of \"{}\" in stock.",
                item.product.stock, item.product.name
            )),
            Some(_) => Ok(()),
            None => Err("That item is no longer in your cart.".to_owned()),
        }
    }

    fn begin(&self) {
        let mut state = write_lock(&self.state);
        state.is_loading = true;
        state.error = None;
    }

    fn begin_item(&self, item_id: CartItemId) {
        let mut state = write_lock(&self.state);
        state.updating_items.insert(item_id);
        state.error = None;
    }

    /// React to a cross-store event: the cart follows the session.
    pub async fn handle_event(&self, event: &StoreEvent) {
        match event {
            StoreEvent::SessionStarted => {
                debug!("session started, loading cart");
                if let Err(err) = self.load_cart().await {
                    warn!(error = %err, "cart load after login failed");
                }
            }
            StoreEvent::SessionEnded => {
                debug!("session ended, dropping cart");
                let mut state = write_lock(&self.state);
                state.cart = None;
                state.updating_items.clear();
                state.is_loading = false;
            }
            StoreEvent::ProductStockChanged { .. } => {}
        }
    }

    /// Drive [`Self::handle_event`] from a bus subscription.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<StoreEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "cart store lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    // Getters

    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        read_lock(&self.state).cart.clone()
    }

    /// Derived: total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        read_lock(&self.state)
            .cart
            .as_ref()
            .map_or(0, Cart::item_count)
    }

    /// Derived: sum of `quantity * price` across all lines.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        read_lock(&self.state)
            .cart
            .as_ref()
            .map_or(Decimal::ZERO, Cart::total)
    }

    /// Whether a mutation for this specific row is in flight.
    #[must_use]
    pub fn is_updating_item(&self, item_id: CartItemId) -> bool {
        read_lock(&self.state).updating_items.contains(&item_id)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        read_lock(&self.state).is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        read_lock(&self.state).error.clone()
    }

    pub fn clear_error(&self) {
        write_lock(&self.state).error = None;
    }
}
