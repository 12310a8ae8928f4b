//! Inventory, review and dashboard scenarios, plus the inventory to
//! catalog stock-refresh coupling.

use inkbound_client::api::Method;
use inkbound_client::events::StoreEvent;
use inkbound_client::types::{NewReview, NewTransaction, ReviewPatch};
use inkbound_core::{ProductId, ReviewId, StockMovement};
use serde_json::json;
use uuid::Uuid;

use inkbound_integration_tests::{
    init_tracing, mock_stores, product_json, review_json, transaction_json,
};

#[tokio::test]
async fn manual_transactions_prepend_and_refresh_the_product() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let product_id = Uuid::new_v4();
    let existing = Uuid::new_v4();
    mock.expect_success(
        Method::Get,
        &format!("/inventory/product/{product_id}"),
        json!({"transactions": [transaction_json(existing, product_id, "out", 2)]}),
    );
    let new_tx = Uuid::new_v4();
    mock.expect_success(
        Method::Post,
        "/inventory",
        json!({"transaction": transaction_json(new_tx, product_id, "in", 10)}),
    );
    // The catalog's event handler refetches the product detail.
    mock.expect_success(
        Method::Get,
        &format!("/product/{product_id}"),
        json!({"product": product_json(product_id, "A Wizard of Earthsea", 9.99, 15)}),
    );

    stores
        .inventory()
        .transactions_for_product(ProductId::new(product_id))
        .await
        .expect("history");
    assert_eq!(stores.inventory().transactions().len(), 1);

    let mut events = stores.events().subscribe();
    stores
        .inventory()
        .add_manual_transaction(NewTransaction {
            product_id: ProductId::new(product_id),
            movement: StockMovement::In,
            quantity: 10,
            reason: "Restock from warehouse".to_owned(),
            order_id: None,
        })
        .await
        .expect("manual transaction");

    let transactions = stores.inventory().transactions();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].quantity, 10, "newest entry first");

    let event = events.recv().await.expect("event");
    assert_eq!(
        event,
        StoreEvent::ProductStockChanged {
            product_id: ProductId::new(product_id)
        }
    );

    stores.catalog().handle_event(&event).await;
    let refreshed = stores.catalog().product().expect("detail slot");
    assert_eq!(refreshed.stock, 15, "stock figure is current again");
}

#[tokio::test]
async fn review_crud_keeps_the_cached_list_in_step() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let product_id = Uuid::new_v4();
    let kept = Uuid::new_v4();
    let edited = Uuid::new_v4();
    mock.expect_success(
        Method::Get,
        &format!("/review/product/{product_id}"),
        json!({"reviews": [
            review_json(kept, product_id, 5, "Beautiful edition"),
            review_json(edited, product_id, 2, "Pages arrived creased"),
        ]}),
    );

    stores
        .review()
        .fetch_reviews(ProductId::new(product_id))
        .await
        .expect("fetch");
    assert_eq!(stores.review().reviews().len(), 2);

    // Prepend on create.
    let added = Uuid::new_v4();
    mock.expect_success(
        Method::Post,
        "/reviews",
        json!({"review": review_json(added, product_id, 4, "Lovely paper stock")}),
    );
    stores
        .review()
        .add_review(NewReview {
            product_id: ProductId::new(product_id),
            rating: 4,
            comment: Some("Lovely paper stock".to_owned()),
        })
        .await
        .expect("add");
    let reviews = stores.review().reviews();
    assert_eq!(reviews.len(), 3);
    assert_eq!(reviews[0].id, ReviewId::new(added));

    // Patch in place on edit.
    mock.expect_success(
        Method::Put,
        &format!("/reviews/{edited}"),
        json!({"review": review_json(edited, product_id, 3, "Replacement was fine")}),
    );
    stores
        .review()
        .edit_review(
            ReviewId::new(edited),
            ReviewPatch {
                rating: Some(3),
                comment: Some("Replacement was fine".to_owned()),
            },
        )
        .await
        .expect("edit");
    let reviews = stores.review().reviews();
    assert_eq!(reviews.len(), 3);
    let row = reviews
        .iter()
        .find(|r| r.id == ReviewId::new(edited))
        .expect("edited row");
    assert_eq!(row.rating, 3);

    // Drop on delete.
    mock.expect_success(Method::Delete, &format!("/reviews/{kept}"), json!(null));
    stores
        .review()
        .remove_review(ReviewId::new(kept))
        .await
        .expect("remove");
    let reviews = stores.review().reviews();
    assert_eq!(reviews.len(), 2);
    assert!(reviews.iter().all(|r| r.id != ReviewId::new(kept)));
}

#[tokio::test]
async fn review_fetch_failure_clears_the_list() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let product_id = Uuid::new_v4();
    mock.expect_success(
        Method::Get,
        &format!("/review/product/{product_id}"),
        json!({"reviews": [review_json(Uuid::new_v4(), product_id, 5, "Great")]}),
    );
    stores
        .review()
        .fetch_reviews(ProductId::new(product_id))
        .await
        .expect("fetch");

    mock.expect_failure(
        Method::Get,
        &format!("/review/product/{product_id}"),
        500,
        "reviews backend down",
    );
    let err = stores
        .review()
        .fetch_reviews(ProductId::new(product_id))
        .await
        .expect_err("failure");
    assert_eq!(err.to_string(), "reviews backend down");
    assert!(stores.review().reviews().is_empty());
}

#[tokio::test]
async fn dashboard_fetches_both_series_and_replaces_wholesale() {
    init_tracing();
    let (stores, mock) = mock_stores();
    mock.expect_success(
        Method::Get,
        "/dashboard/sales-over-time",
        json!([
            {"date": "2026-08-01", "totalSales": 412.50},
            {"date": "2026-08-02", "totalSales": 98.00},
        ]),
    );
    mock.expect_success(
        Method::Get,
        "/dashboard/top-selling-products",
        json!([
            {"name": "A Wizard of Earthsea", "totalSold": 41},
            {"name": "Dot-grid notebook", "totalSold": 23},
        ]),
    );

    stores
        .dashboard()
        .fetch_dashboard_data()
        .await
        .expect("dashboard");

    assert_eq!(stores.dashboard().sales().len(), 2);
    assert_eq!(stores.dashboard().top_products().len(), 2);
    assert_eq!(stores.dashboard().top_products()[0].total_sold, 41);
    assert!(!stores.dashboard().is_loading());
    assert_eq!(mock.requests().len(), 2);
}

#[tokio::test]
async fn dashboard_failure_leaves_both_slots_untouched() {
    init_tracing();
    let (stores, mock) = mock_stores();
    mock.expect_success(
        Method::Get,
        "/dashboard/sales-over-time",
        json!([{"date": "2026-08-01", "totalSales": 412.50}]),
    );
    mock.expect_failure(
        Method::Get,
        "/dashboard/top-selling-products",
        500,
        "aggregation timed out",
    );

    let err = stores
        .dashboard()
        .fetch_dashboard_data()
        .await
        .expect_err("failure");
    assert_eq!(err.to_string(), "aggregation timed out");
    assert!(stores.dashboard().sales().is_empty());
    assert!(stores.dashboard().top_products().is_empty());
    assert_eq!(
        stores.dashboard().error().as_deref(),
        Some("aggregation timed out")
    );
}
