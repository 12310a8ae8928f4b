//! Cart store scenarios: derived totals, local validation, per-row busy
//! markers, session coupling.

use std::time::Duration;

use inkbound_client::api::Method;
use inkbound_client::events::StoreEvent;
use inkbound_core::{CartItemId, ProductId};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use inkbound_integration_tests::{cart_item_json, cart_json, init_tracing, mock_stores};

#[tokio::test]
async fn adding_a_product_yields_derived_totals() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    let product_id = Uuid::new_v4();
    let item = cart_item_json(Uuid::new_v4(), product_id, 9.99, 5, 1);
    mock.expect_success(
        Method::Post,
        "/cart/items",
        json!({"cart": cart_json(user_id, vec![item])}),
    );

    stores
        .cart()
        .add_to_cart(ProductId::new(product_id), 1)
        .await
        .expect("add");

    assert_eq!(stores.cart().item_count(), 1);
    assert_eq!(
        stores.cart().cart_total(),
        "9.99".parse::<Decimal>().expect("decimal")
    );
}

#[tokio::test]
async fn out_of_range_quantities_are_rejected_without_a_request() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    let item_id = Uuid::new_v4();
    let item = cart_item_json(item_id, Uuid::new_v4(), 9.99, 5, 1);
    mock.expect_success(
        Method::Get,
        "/cart",
        json!({"cart": cart_json(user_id, vec![item])}),
    );
    stores.cart().load_cart().await.expect("load");
    let requests_before = mock.requests().len();

    // Above the snapshot's stock.
    let err = stores
        .cart()
        .update_item_quantity(CartItemId::new(item_id), 6)
        .await
        .expect_err("rejected");
    assert!(matches!(err, inkbound_client::api::ApiError::Validation(_)));

    // Below one.
    let err = stores
        .cart()
        .update_item_quantity(CartItemId::new(item_id), 0)
        .await
        .expect_err("rejected");
    assert!(matches!(err, inkbound_client::api::ApiError::Validation(_)));

    assert_eq!(mock.requests().len(), requests_before, "no call was made");
    let cart = stores.cart().cart().expect("cart");
    assert_eq!(cart.items[0].quantity, 1, "cart is unchanged");
}

#[tokio::test(start_paused = true)]
async fn only_the_mutating_row_is_marked_busy() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    let busy_id = Uuid::new_v4();
    let idle_id = Uuid::new_v4();
    let items = vec![
        cart_item_json(busy_id, Uuid::new_v4(), 9.99, 5, 1),
        cart_item_json(idle_id, Uuid::new_v4(), 4.50, 9, 2),
    ];
    mock.expect_success(
        Method::Get,
        "/cart",
        json!({"cart": cart_json(user_id, vec![items[0].clone(), items[1].clone()])}),
    );
    stores.cart().load_cart().await.expect("load");

    let updated = vec![
        cart_item_json(busy_id, Uuid::new_v4(), 9.99, 5, 3),
        items[1].clone(),
    ];
    mock.expect_success_after(
        Method::Put,
        &format!("/cart/items/{busy_id}"),
        Duration::from_millis(10),
        json!({"cart": cart_json(user_id, updated)}),
    );

    let cart = stores.cart();
    let (update, ()) = tokio::join!(
        cart.update_item_quantity(CartItemId::new(busy_id), 3),
        async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            assert!(cart.is_updating_item(CartItemId::new(busy_id)));
            assert!(!cart.is_updating_item(CartItemId::new(idle_id)));
        }
    );
    update.expect("update");
    assert!(!cart.is_updating_item(CartItemId::new(busy_id)));
    assert_eq!(stores.cart().item_count(), 5);
}

#[tokio::test]
async fn emptying_the_cart_clears_items_without_a_refetch() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    let item = cart_item_json(Uuid::new_v4(), Uuid::new_v4(), 9.99, 5, 2);
    mock.expect_success(
        Method::Get,
        "/cart",
        json!({"cart": cart_json(user_id, vec![item])}),
    );
    mock.expect_success(Method::Delete, "/cart", json!(null));

    stores.cart().load_cart().await.expect("load");
    stores.cart().empty_cart().await.expect("empty");

    let cart = stores.cart().cart().expect("cart object survives");
    assert!(cart.items.is_empty());
    assert_eq!(stores.cart().item_count(), 0);
    assert_eq!(stores.cart().cart_total(), Decimal::ZERO);
    assert_eq!(mock.requests().len(), 2, "no refetch after the clear");
}

#[tokio::test]
async fn rejected_mutations_record_the_message_and_keep_the_cart() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    let item = cart_item_json(Uuid::new_v4(), Uuid::new_v4(), 9.99, 5, 2);
    mock.expect_success(
        Method::Get,
        "/cart",
        json!({"cart": cart_json(user_id, vec![item])}),
    );
    mock.expect_failure(Method::Post, "/cart/items", 400, "Insufficient stock");

    stores.cart().load_cart().await.expect("load");
    let err = stores
        .cart()
        .add_to_cart(ProductId::new(Uuid::new_v4()), 3)
        .await
        .expect_err("rejected");
    assert_eq!(err.to_string(), "Insufficient stock");
    assert_eq!(stores.cart().error().as_deref(), Some("Insufficient stock"));
    assert_eq!(stores.cart().item_count(), 2, "cart kept its last state");
    assert!(!stores.cart().is_loading());
}

#[tokio::test]
async fn the_cart_follows_the_session_lifecycle() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    let item = cart_item_json(Uuid::new_v4(), Uuid::new_v4(), 9.99, 5, 1);
    mock.expect_success(
        Method::Get,
        "/cart",
        json!({"cart": cart_json(user_id, vec![item])}),
    );

    stores
        .cart()
        .handle_event(&StoreEvent::SessionStarted)
        .await;
    assert_eq!(stores.cart().item_count(), 1);

    stores.cart().handle_event(&StoreEvent::SessionEnded).await;
    assert!(stores.cart().cart().is_none());
    assert_eq!(stores.cart().item_count(), 0);
}
