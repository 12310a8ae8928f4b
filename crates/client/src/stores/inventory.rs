//! Inventory store: the append-only transaction log, per product.

use std::sync::RwLock;

use serde::Deserialize;
use tracing::instrument;

use inkbound_core::ProductId;

use crate::api::{ApiClient, ApiError};
use crate::events::{EventBus, StoreEvent};
use crate::types::{InventoryTransaction, NewTransaction};

use super::{read_lock, write_lock};

#[derive(Debug, Default)]
struct InventoryState {
    transactions: Vec<InventoryTransaction>,
    is_loading: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct TransactionListBody {
    transactions: Vec<InventoryTransaction>,
}

#[derive(Deserialize)]
struct TransactionBody {
    transaction: InventoryTransaction,
}

/// Owns the inventory history of the product currently under
/// management.
///
/// Transactions are never edited: fetches replace the list, new manual
/// transactions are prepended. A successful manual transaction changes
/// the product's stock figure on the server, so the store publishes
/// [`StoreEvent::ProductStockChanged`] and the catalog store refreshes
/// the affected product.
pub struct InventoryStore {
    api: ApiClient,
    events: EventBus,
    state: RwLock<InventoryState>,
}

impl InventoryStore {
    pub(crate) fn new(api: ApiClient, events: EventBus) -> Self {
        Self {
            api,
            events,
            state: RwLock::new(InventoryState::default()),
        }
    }

    /// Fetch the transaction history for one product, replacing the
    /// cached list.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the list is cleared on failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn transactions_for_product(&self, product_id: ProductId) -> Result<(), ApiError> {
        {
            let mut state = write_lock(&self.state);
            state.is_loading = true;
            state.error = None;
        }

        let result = self
            .api
            .get::<TransactionListBody>(&format!("/inventory/product/{product_id}"))
            .await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.transactions = body.transactions;
                Ok(())
            }
            Err(err) => {
                state.transactions.clear();
                state.error = Some(err.message_or("Failed to load inventory history."));
                Err(err)
            }
        }
    }

    /// Record a manual stock adjustment.
    ///
    /// The new transaction is prepended to the cached history, and a
    /// stock-changed event goes out so the catalog's copy of the product
    /// stays current.
    ///
    /// # Errors
    ///
    /// Propagates the rejection untouched; the admin form owns the
    /// feedback.
    #[instrument(skip(self, transaction))]
    pub async fn add_manual_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<InventoryTransaction, ApiError> {
        let product_id = transaction.product_id;
        let body = self
            .api
            .post::<TransactionBody, _>("/inventory", &transaction)
            .await?;

        write_lock(&self.state)
            .transactions
            .insert(0, body.transaction.clone());
        self.events
            .publish(StoreEvent::ProductStockChanged { product_id });
        Ok(body.transaction)
    }

    // Getters

    #[must_use]
    pub fn transactions(&self) -> Vec<InventoryTransaction> {
        read_lock(&self.state).transactions.clone()
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
