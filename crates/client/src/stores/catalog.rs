//! Catalog store: product list, detail slot and admin product CRUD.

use std::sync::{Arc, RwLock};

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use inkbound_core::ProductId;
use tokio::sync::broadcast;

use crate::api::{ApiClient, ApiError, FilePart};
use crate::events::StoreEvent;
use crate::types::{Page, Product, ProductDraft, ProductFilters, ProductPatch};

use super::{RequestSeq, read_lock, write_lock};

#[derive(Debug, Default)]
struct CatalogState {
    page: Option<Page<Product>>,
    detail: Option<Product>,
    is_loading: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ProductBody {
    product: Product,
}

// The list endpoint nests its page under a second `products` key.
#[derive(Deserialize)]
struct ProductListBody {
    products: ProductPageBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductPageBody {
    products: Vec<Product>,
    total: u64,
    total_pages: u32,
    current_page: u32,
}

impl From<ProductPageBody> for Page<Product> {
    fn from(body: ProductPageBody) -> Self {
        Self {
            items: body.products,
            total: body.total,
            total_pages: body.total_pages,
            current_page: body.current_page,
        }
    }
}

/// Owns product list/detail state and the admin product mutations.
///
/// List refetches are fenced with monotonic tokens: when several fetches
/// overlap, only the latest-issued one may write its response, whatever
/// order the responses arrive in. Callers still debounce search input;
/// fencing just removes the stale-overwrite hazard.
pub struct CatalogStore {
    api: ApiClient,
    state: RwLock<CatalogState>,
    list_seq: RequestSeq,
}

impl CatalogStore {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(CatalogState::default()),
            list_seq: RequestSeq::default(),
        }
    }

    /// Fetch the product list for a filter set, replacing list and
    /// pagination metadata wholesale.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; list views render the recorded message.
    /// A stale response (superseded by a later fetch) is discarded and
    /// reported as success.
    #[instrument(skip(self, filters))]
    pub async fn fetch_all_products(&self, filters: &ProductFilters) -> Result<(), ApiError> {
        let token = self.list_seq.issue();
        {
            let mut state = write_lock(&self.state);
            state.is_loading = true;
            state.error = None;
        }

        let result = self
            .api
            .get_query::<ProductListBody>("/product", &filters.to_query())
            .await;

        if !self.list_seq.is_current(token) {
            debug!(token, "discarding stale product list response");
            return Ok(());
        }

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.page = Some(body.products.into());
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to load products."));
                Err(err)
            }
        }
    }

    /// Fetch one product into the detail slot.
    ///
    /// Pair with [`Self::clear_product`] on view teardown so a later
    /// visitor never sees a stale detail flash.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the detail slot is cleared on failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn fetch_product_by_id(&self, product_id: ProductId) -> Result<Product, ApiError> {
        {
            let mut state = write_lock(&self.state);
            state.is_loading = true;
            state.error = None;
        }

        let result = self
            .api
            .get::<ProductBody>(&format!("/product/{product_id}"))
            .await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.detail = Some(body.product.clone());
                Ok(body.product)
            }
            Err(err) => {
                state.detail = None;
                state.error = Some(err.message_or("Could not find the requested product."));
                Err(err)
            }
        }
    }

    /// Clear the detail slot.
    pub fn clear_product(&self) {
        write_lock(&self.state).detail = None;
    }

    /// Create a product (admin only).
    ///
    /// Two phases: the text fields are submitted first; if images were
    /// supplied they are uploaded in a follow-up call keyed by the new
    /// product id, and the image-enriched product is returned. When the
    /// image phase fails after the text phase succeeded, the error is
    /// surfaced and the text-only product stays on the server - the
    /// caller sees a partial-failure state, not a rollback.
    ///
    /// # Errors
    ///
    /// Propagates the first failing phase.
    #[instrument(skip(self, draft, images))]
    pub async fn create_product(
        &self,
        draft: ProductDraft,
        images: Vec<FilePart>,
    ) -> Result<Product, ApiError> {
        {
            let mut state = write_lock(&self.state);
            state.is_loading = true;
            state.error = None;
        }

        let result = self.create_product_phases(draft, images).await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        if let Err(err) = &result {
            state.error = Some(err.message_or("Failed to create product."));
        }
        result
    }

    async fn create_product_phases(
        &self,
        draft: ProductDraft,
        images: Vec<FilePart>,
    ) -> Result<Product, ApiError> {
        let created = self.api.post::<ProductBody, _>("/product", &draft).await?;
        if images.is_empty() {
            return Ok(created.product);
        }

        let enriched = self
            .api
            .upload::<ProductBody>(&format!("/product/{}/images", created.product.id), images)
            .await?;
        Ok(enriched.product)
    }

    /// Update a product (admin only). The detail slot and the cached
    /// list row are patched in place.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the message is recorded for the form.
    #[instrument(skip(self, patch), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, ApiError> {
        {
            let mut state = write_lock(&self.state);
            state.is_loading = true;
            state.error = None;
        }

        let result = self
            .api
            .put::<ProductBody, _>(&format!("/product/{product_id}"), &patch)
            .await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                if state
                    .detail
                    .as_ref()
                    .is_some_and(|detail| detail.id == product_id)
                {
                    state.detail = Some(body.product.clone());
                }
                if let Some(page) = &mut state.page {
                    for row in &mut page.items {
                        if row.id == product_id {
                            *row = body.product.clone();
                        }
                    }
                }
                Ok(body.product)
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to update product."));
                Err(err)
            }
        }
    }

    /// Soft-delete a product (admin only). The row is dropped from the
    /// cached page; a matching detail slot is cleared.
    ///
    /// # Errors
    ///
    /// Propagates the rejection.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<(), ApiError> {
        let result = self.api.delete::<()>(&format!("/product/{product_id}")).await;

        let mut state = write_lock(&self.state);
        match result {
            Ok(()) => {
                if let Some(page) = &mut state.page {
                    let before = page.items.len();
                    page.items.retain(|row| row.id != product_id);
                    let removed = before - page.items.len();
                    page.total = page.total.saturating_sub(removed as u64);
                }
                if state
                    .detail
                    .as_ref()
                    .is_some_and(|detail| detail.id == product_id)
                {
                    state.detail = None;
                }
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to delete product."));
                Err(err)
            }
        }
    }

    /// React to a cross-store event.
    pub async fn handle_event(&self, event: &StoreEvent) {
        if let StoreEvent::ProductStockChanged { product_id } = event {
            debug!(%product_id, "refreshing product after stock change");
            if let Err(err) = self.fetch_product_by_id(*product_id).await {
                warn!(error = %err, "stock-change refresh failed");
            }
        }
    }

    /// Drive [`Self::handle_event`] from a bus subscription.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<StoreEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "catalog store lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    // Getters

    /// Current list rows (empty when nothing has been fetched).
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        read_lock(&self.state)
            .page
            .as_ref()
            .map(|page| page.items.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn page(&self) -> Option<Page<Product>> {
        read_lock(&self.state).page.clone()
    }

    #[must_use]
    pub fn product(&self) -> Option<Product> {
        read_lock(&self.state).detail.clone()
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
