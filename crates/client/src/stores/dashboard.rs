//! Dashboard store: read-only sales aggregates for the admin overview.

use std::sync::RwLock;

use tracing::instrument;

use crate::api::{ApiClient, ApiError};
use crate::types::{SalesPoint, TopProduct};

use super::{read_lock, write_lock};

#[derive(Debug, Default)]
struct DashboardState {
    sales: Vec<SalesPoint>,
    top_products: Vec<TopProduct>,
    is_loading: bool,
    error: Option<String>,
}

/// Owns the admin dashboard aggregates. Both series are computed by the
/// server; this store only caches them.
pub struct DashboardStore {
    api: ApiClient,
    state: RwLock<DashboardState>,
}

impl DashboardStore {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(DashboardState {
                is_loading: true,
                ..DashboardState::default()
            }),
        }
    }

    /// Fetch both dashboard series concurrently and replace them
    /// wholesale.
    ///
    /// # Errors
    ///
    /// Propagates the first failing fetch; neither slot is updated
    /// unless both succeed.
    #[instrument(skip(self))]
    pub async fn fetch_dashboard_data(&self) -> Result<(), ApiError> {
        {
            let mut state = write_lock(&self.state);
            state.is_loading = true;
            state.error = None;
        }

        let (sales, top_products) = tokio::join!(
            self.api.get::<Vec<SalesPoint>>("/dashboard/sales-over-time"),
            self.api
                .get::<Vec<TopProduct>>("/dashboard/top-selling-products"),
        );

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match (sales, top_products) {
            (Ok(sales), Ok(top_products)) => {
                state.sales = sales;
                state.top_products = top_products;
                Ok(())
            }
            (Err(err), _) | (_, Err(err)) => {
                state.error = Some(err.message_or("Failed to fetch dashboard data."));
                Err(err)
            }
        }
    }

    // Getters

    #[must_use]
    pub fn sales(&self) -> Vec<SalesPoint> {
        read_lock(&self.state).sales.clone()
    }

    #[must_use]
    pub fn top_products(&self) -> Vec<TopProduct> {
        read_lock(&self.state).top_products.clone()
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
