//! Category store: the cached category tree and its admin CRUD.
//!
//! The tree is small, so every mutation refetches it wholesale instead
//! of patching nodes in place.

use std::sync::RwLock;

use serde::Deserialize;
use tracing::instrument;

use inkbound_core::CategoryId;

use crate::api::{ApiClient, ApiError};
use crate::types::{Category, CategoryDraft, CategoryPatch};

use super::{read_lock, write_lock};

#[derive(Debug, Default)]
struct CategoryState {
    tree: Vec<Category>,
    is_loading: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryTreeBody {
    category_tree: Vec<Category>,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct CategoryBody {
    category: Category,
}

/// Owns the category forest.
pub struct CategoryStore {
    api: ApiClient,
    state: RwLock<CategoryState>,
}

impl CategoryStore {
    pub(crate) fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(CategoryState::default()),
        }
    }

    /// Fetch the full category tree, replacing the cached forest.
    ///
    /// # Errors
    ///
    /// Propagates the rejection; the message is recorded for the view.
    #[instrument(skip(self))]
    pub async fn fetch_category_tree(&self) -> Result<(), ApiError> {
        self.begin();
        let result = self.api.get::<CategoryTreeBody>("/categories").await;

        let mut state = write_lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(body) => {
                state.tree = body.category_tree;
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.message_or("Failed to load categories."));
                Err(err)
            }
        }
    }

    /// Create a category (admin only), then refetch the tree so callers
    /// see the new node without issuing a second fetch themselves.
    ///
    /// # Errors
    ///
    /// Propagates the rejection of either the mutation or the refetch.
    #[instrument(skip(self, draft))]
    pub async fn create_category(&self, draft: CategoryDraft) -> Result<(), ApiError> {
        self.begin();
        let outcome = self
            .api
            .post::<CategoryBody, _>("/categories", &draft)
            .await
            .map(|_| ());
        self.settle_mutation(outcome, "Failed to create category.")
            .await
    }

    /// Update a category (admin only), then refetch the tree.
    ///
    /// # Errors
    ///
    /// Propagates the rejection of either the mutation or the refetch.
    #[instrument(skip(self, patch), fields(category_id = %category_id))]
    pub async fn update_category(
        &self,
        category_id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<(), ApiError> {
        self.begin();
        let outcome = self
            .api
            .put::<CategoryBody, _>(&format!("/categories/{category_id}"), &patch)
            .await
            .map(|_| ());
        self.settle_mutation(outcome, "Failed to update category.")
            .await
    }

    /// Delete a category (admin only), then refetch the tree.
    ///
    /// The server refuses to delete a category that still has children
    /// or products; that arrives here as a normal rejection.
    ///
    /// # Errors
    ///
    /// Propagates the rejection of either the mutation or the refetch.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn delete_category(&self, category_id: CategoryId) -> Result<(), ApiError> {
        self.begin();
        let outcome = self
            .api
            .delete::<()>(&format!("/categories/{category_id}"))
            .await;
        self.settle_mutation(outcome, "Failed to delete category.")
            .await
    }

    fn begin(&self) {
        let mut state = write_lock(&self.state);
        state.is_loading = true;
        state.error = None;
    }

    async fn settle_mutation(
        &self,
        outcome: Result<(), ApiError>,
        fallback: &str,
    ) -> Result<(), ApiError> {
        match outcome {
            Ok(()) => self.fetch_category_tree().await,
            Err(err) => {
                let mut state = write_lock(&self.state);
                state.is_loading = false;
                state.error = Some(err.message_or(fallback));
                Err(err)
            }
        }
    }

    // Getters

    #[must_use]
    pub fn tree(&self) -> Vec<Category> {
        read_lock(&self.state).tree.clone()
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

/// Flatten a category forest into a pre-order list.
///
/// A pure derived view: parents precede their children, siblings keep
/// their order, and the tree itself is untouched.
#[must_use]
pub fn flatten_categories(categories: &[Category]) -> Vec<Category> {
    let mut flat = Vec::new();
    for node in categories {
        flat.push(node.clone());
        flat.extend(flatten_categories(&node.children));
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(id: i32, name: &str, children: Vec<Category>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_owned(),
            slug: name.to_lowercase(),
            parent_id: None,
            is_active: true,
            children,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn flattening_is_pre_order() {
        let tree = vec![
            category(
                1,
                "Books",
                vec![
                    category(2, "Fiction", vec![category(3, "Fantasy", Vec::new())]),
                    category(4, "Poetry", Vec::new()),
                ],
            ),
            category(5, "Stationery", Vec::new()),
        ];

        let names: Vec<String> = flatten_categories(&tree)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Books", "Fiction", "Fantasy", "Poetry", "Stationery"]);
    }

    #[test]
    fn flattening_an_empty_forest_is_empty() {
        assert!(flatten_categories(&[]).is_empty());
    }
}
