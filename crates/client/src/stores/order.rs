//! Order store: order history, order detail, and the admin order list.
//!
//! The my-orders list, the detail slot and the admin page are three
//! independent caches of overlapping data; single-row updates patch every
//! cache that holds the row, explicitly.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use inkbound_core::{OrderId, OrderStatus};
use tokio::sync::broadcast;

use crate::api::{ApiClient, ApiError};
use crate::events::StoreEvent;
use crate::types::{NewOrder, Order, Page};

use super::{RequestSeq, read_lock, write_lock};

#[derive(Debug, Default)]
struct OrderState {
    orders: Vec<Order>,
    current: Option<Order>,
    admin_page: Option<Page<Order>>,
    is_loading: bool,
    is_updating: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct OrderBody {
    order: Order,
}

#[derive(Deserialize)]
struct OrderListBody {
    orders: Vec<Order>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminOrderPageBody {
    orders: Vec<Order>,
    total_orders: u64,
    total_pages: u32,
    current_page: u32,
}

impl From<AdminOrderPageBody> for Page<Order> {
    fn from(body: AdminOrderPageBody) -> Self {
        Self {
            items: body.orders,
            total: body.total_orders,
            total_pages: body.total_pages,
            current_page: body.current_page,
        }
    }
}

#[derive(Serialize)]
struct StatusBody {
    status: OrderStatus,
}

/// Owns order history, the order detail slot and the admin paginated
/// order list.
pub struct OrderStore {
    api: ApiClient,
    state: RwLock<OrderState>,
    admin_seq: RequestSeq,
}

impl OrderStore {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(OrderState::default()),
            admin_seq: RequestSeq::default(),
        }
    }

    /// Fetch the authenticated user's order history.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the message is recorded for the view.
    #[instrument(skip(self))]
    pub async fn fetch_my_orders(&self) -> Result<(), ApiError> {
        self.begin_loading();
        let result = self.api.get::<OrderListBody>("/order").await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.orders = body.orders;
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to fetch your orders."));
                Err(err)
            }
        }
    }

    /// Fetch one order into the detail slot.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the detail slot is cleared on failure.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn fetch_order_details(&self, order_id: OrderId) -> Result<Order, ApiError> {
        self.begin_loading();
        let result = self.api.get::<OrderBody>(&format!("/order/{order_id}")).await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.current = Some(body.order.clone());
                Ok(body.order)
            }
            Err(err) => {
                state.current = None;
                state.error = Some(err.message_or("Could not find the requested order."));
                Err(err)
            }
        }
    }

    /// Clear the detail slot on view teardown.
    pub fn clear_current_order(&self) {
        write_lock(&self.state).current = None;
    }

    /// Place an order from the current cart.
    ///
    /// The new order is prepended to the local history; the list is not
    /// refetched.
    ///
    /// # Errors
    ///
    /// Propagates the rejection so checkout can react.
    #[instrument(skip(self, order))]
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, ApiError> {
        self.begin_loading();
        let result = self.api.post::<OrderBody, _>("/order", &order).await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.orders.insert(0, body.order.clone());
                Ok(body.order)
            }
            Err(err) => {
                state.error = Some(err.message_or("There was a problem placing your order."));
                Err(err)
            }
        }
    }

    /// Fetch a page of all orders (admin only), replacing the admin slot
    /// wholesale. Token-fenced like the catalog list.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; a stale response is discarded and
    /// reported as success.
    #[instrument(skip(self))]
    pub async fn fetch_all_admin_orders(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<(), ApiError> {
        let token = self.admin_seq.issue();
        self.begin_loading();

        let mut query = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let result = self
            .api
            .get_query::<AdminOrderPageBody>("/order/admin/all", &query)
            .await;

        if !self.admin_seq.is_current(token) {
            debug!(token, "discarding stale admin order page");
            return Ok(());
        }

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.admin_page = Some(body.into());
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to fetch all orders."));
                Err(err)
            }
        }
    }

    /// Change an order's status (admin only).
    ///
    /// The update response carries no buyer snapshot, so the cached admin
    /// row keeps the one it already has; the detail slot is patched too
    /// when it holds the same order.
    ///
    /// # Errors
    ///
    /// Propagates the rejection so the admin table can react.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_status_admin(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        self.begin_updating();
        let result = self
            .api
            .put::<OrderBody, _>(
                &format!("/order/admin/{order_id}/status"),
                &StatusBody { status },
            )
            .await;

        let mut state = write_lock(&self.state);
        state.is_updating = false;
        match result {
            Ok(body) => {
                if let Some(page) = &mut state.admin_page {
                    for row in &mut page.items {
                        if row.id == order_id {
                            let customer = row.customer.take();
                            *row = body.order.clone();
                            row.customer = customer;
                        }
                    }
                }
                if state
                    .current
                    .as_ref()
                    .is_some_and(|current| current.id == order_id)
                {
                    state.current = Some(body.order.clone());
                }
                Ok(body.order)
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to update order status."));
                Err(err)
            }
        }
    }

    /// Cancel one of the user's own orders.
    ///
    /// Eligibility is checked with [`Order::is_cancellable`] by the view;
    /// the server remains the authority and may still reject. On success
    /// both the history row and a matching detail slot are patched.
    ///
    /// # Errors
    ///
    /// Propagates the rejection so the view can toast it.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_user_order(&self, order_id: OrderId) -> Result<Order, ApiError> {
        self.begin_updating();
        let result = self
            .api
            .delete::<OrderBody>(&format!("/order/{order_id}"))
            .await;

        let mut state = write_lock(&self.state);
        state.is_updating = false;
        match result {
            Ok(body) => {
                if state
                    .current
                    .as_ref()
                    .is_some_and(|current| current.id == order_id)
                {
                    state.current = Some(body.order.clone());
                }
                for row in &mut state.orders {
                    if row.id == order_id {
                        *row = body.order.clone();
                    }
                }
                Ok(body.order)
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to cancel the order."));
                Err(err)
            }
        }
    }

    fn begin_loading(&self) {
        let mut state = write_lock(&self.state);
        state.is_loading = true;
        state.error = None;
    }

    fn begin_updating(&self) {
        let mut state = write_lock(&self.state);
        state.is_updating = true;
        state.error = None;
    }

    /// React to a cross-store event: order state is session-scoped.
    pub fn handle_event(&self, event: &StoreEvent) {
        if matches!(event, StoreEvent::SessionEnded) {
            debug!("session ended, dropping order state");
            let mut state = write_lock(&self.state);
            state.orders.clear();
            state.current = None;
            state.admin_page = None;
        }
    }

    /// Drive [`Self::handle_event`] from a bus subscription.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<StoreEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "order store lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    // Getters

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        read_lock(&self.state).orders.clone()
    }

    #[must_use]
    pub fn current_order(&self) -> Option<Order> {
        read_lock(&self.state).current.clone()
    }

    #[must_use]
    pub fn admin_orders(&self) -> Option<Page<Order>> {
        read_lock(&self.state).admin_page.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        read_lock(&self.state).is_loading
    }

    #[must_use]
    pub fn is_updating(&self) -> bool {
        read_lock(&self.state).is_updating
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        read_lock(&self.state).error.clone()
    }

    pub fn clear_error(&self) {
        write_lock(&self.state).error = None;
    }
}
