//! Review store: the review list of one product at a time.
//!
//! No aggregate is cached here; the average rating is recomputed by the
//! view from the list.

use std::sync::RwLock;

use serde::Deserialize;
use tracing::instrument;

use inkbound_core::{ProductId, ReviewId};

use crate::api::{ApiClient, ApiError};
use crate::types::{NewReview, Review, ReviewPatch};

use super::{read_lock, write_lock};

#[derive(Debug, Default)]
struct ReviewState {
    reviews: Vec<Review>,
    is_loading: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ReviewListBody {
    reviews: Vec<Review>,
}

#[derive(Deserialize)]
struct ReviewBody {
    review: Review,
}

/// Owns the reviews of the product currently on screen.
pub struct ReviewStore {
    api: ApiClient,
    state: RwLock<ReviewState>,
}

impl ReviewStore {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(ReviewState::default()),
        }
    }

    /// Fetch all reviews for a product, replacing the cached list.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the list is cleared on failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn fetch_reviews(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.begin();
        let result = self
            .api
            .get::<ReviewListBody>(&format!("/review/product/{product_id}"))
            .await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.reviews = body.reviews;
                Ok(())
            }
            Err(err) => {
                state.reviews.clear();
                state.error = Some(err.message_or("Failed to fetch reviews."));
                Err(err)
            }
        }
    }

    /// Post a review; the new entry is prepended to the cached list.
    ///
    /// # Errors
    ///
    /// Propagates the rejection so the form can show it.
    #[instrument(skip(self, review))]
    pub async fn add_review(&self, review: NewReview) -> Result<Review, ApiError> {
        self.begin();
        let result = self.api.post::<ReviewBody, _>("/reviews", &review).await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.reviews.insert(0, body.review.clone());
                Ok(body.review)
            }
            Err(err) => {
                state.error = Some(err.message_or("Could not post your review."));
                Err(err)
            }
        }
    }

    /// Edit one of the author's reviews; the cached row is patched in
    /// place.
    ///
    /// # Errors
    ///
    /// Propagates the rejection so the form can show it.
    #[instrument(skip(self, patch), fields(review_id = %review_id))]
    pub async fn edit_review(
        &self,
        review_id: ReviewId,
        patch: ReviewPatch,
    ) -> Result<Review, ApiError> {
        self.begin();
        let result = self
            .api
            .put::<ReviewBody, _>(&format!("/reviews/{review_id}"), &patch)
            .await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                for row in &mut state.reviews {
                    if row.id == review_id {
                        *row = body.review.clone();
                    }
                }
                Ok(body.review)
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to update review."));
                Err(err)
            }
        }
    }

    /// Delete one of the author's reviews; the cached row is dropped.
    ///
    /// # Errors
    ///
    /// Propagates the rejection so the view can toast it.
    #[instrument(skip(self), fields(review_id = %review_id))]
    pub async fn remove_review(&self, review_id: ReviewId) -> Result<(), ApiError> {
        self.begin();
        let result = self.api.delete::<()>(&format!("/reviews/{review_id}")).await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(()) => {
                state.reviews.retain(|row| row.id != review_id);
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to delete review."));
                Err(err)
            }
        }
    }

    fn begin(&self) {
        let mut state = write_lock(&self.state);
        state.is_loading = true;
        state.error = None;
    }

    // Getters

    #[must_use]
    pub fn reviews(&self) -> Vec<Review> {
        read_lock(&self.state).reviews.clone()
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
