//! Scenario tests for the Inkbound store layer.
//!
//! Every test drives real stores over [`MockTransport`], so the full
//! path - store operation, resource client, envelope unwrapping, state
//! application - is exercised without a network. Fixtures here build the
//! wire-shaped JSON the mock returns.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p inkbound-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Utc};
use inkbound_client::stores::Stores;
use inkbound_client::testing::MockTransport;
use serde_json::{Value, json};
use uuid::Uuid;

/// Build a store set over a fresh mock transport.
#[must_use]
pub fn mock_stores() -> (Stores, MockTransport) {
    let mock = MockTransport::new();
    let stores = Stores::with_transport(Box::new(mock.clone()));
    (stores, mock)
}

/// Initialize test logging once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Wire-shaped user object.
#[must_use]
pub fn user_json(id: Uuid, first_name: &str, role: &str) -> Value {
    json!({
        "id": id,
        "firstName": first_name,
        "lastName": "Reader",
        "email": format!("{}@example.com", first_name.to_lowercase()),
        "role": role,
        "provider": "local",
        "isEmailVerified": true,
        "isActive": true,
        "createdAt": now(),
        "updatedAt": now(),
    })
}

/// Wire-shaped product object.
#[must_use]
pub fn product_json(id: Uuid, name: &str, price: f64, stock: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "description": "A fine addition to any shelf.",
        "price": price,
        "sku": format!("SKU-{}", &id.to_string()[..8]),
        "stock": stock,
        "images": [],
        "productType": "Books",
        "author": "Ursula K. Le Guin",
        "isbn": null,
        "brand": null,
        "isActive": true,
        "categoryId": 1,
        "createdAt": now(),
        "updatedAt": now(),
    })
}

/// Wire-shaped product list page (note the nested `products` key the
/// server really sends).
#[must_use]
pub fn product_page_json(products: Vec<Value>, total: u64, current_page: u32) -> Value {
    json!({
        "products": {
            "products": products,
            "total": total,
            "totalPages": 1,
            "currentPage": current_page,
        }
    })
}

/// Wire-shaped cart item with an embedded product snapshot.
#[must_use]
pub fn cart_item_json(item_id: Uuid, product_id: Uuid, price: f64, stock: u32, qty: u32) -> Value {
    json!({
        "id": item_id,
        "quantity": qty,
        "product": {
            "id": product_id,
            "name": "A Wizard of Earthsea",
            "slug": "a-wizard-of-earthsea",
            "price": price,
            "stock": stock,
            "images": [],
        }
    })
}

/// Wire-shaped cart.
#[must_use]
pub fn cart_json(user_id: Uuid, items: Vec<Value>) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "userId": user_id,
        "items": items,
        "createdAt": now(),
        "updatedAt": now(),
    })
}

/// Wire-shaped order with an optional buyer snapshot (admin rows carry
/// one, update responses do not).
#[must_use]
pub fn order_json(
    id: Uuid,
    status: &str,
    created_at: DateTime<Utc>,
    with_customer: bool,
) -> Value {
    let mut order = json!({
        "id": id,
        "orderNumber": format!("INK-{}", &id.to_string()[..6]),
        "totalAmount": "19.98",
        "status": status,
        "shippingAddress": {
            "street": "1 Bindery Lane",
            "city": "Hay-on-Wye",
            "state": "Powys",
            "zipCode": "HR3 5AA",
            "country": "GB",
        },
        "items": [{
            "id": Uuid::new_v4(),
            "quantity": 2,
            "price": "9.99",
            "product": {
                "id": Uuid::new_v4(),
                "name": "A Wizard of Earthsea",
                "sku": "SKU-EARTHSEA",
                "images": [],
            }
        }],
        "createdAt": created_at.to_rfc3339(),
        "updatedAt": now(),
    });
    if with_customer {
        order["user"] = json!({
            "firstName": "Jane",
            "lastName": "Reader",
            "email": "jane@example.com",
        });
    }
    order
}

/// Wire-shaped category tree node.
#[must_use]
pub fn category_json(id: i32, name: &str, children: Vec<Value>) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": name.to_lowercase(),
        "parentId": null,
        "isActive": true,
        "children": children,
        "createdAt": now(),
        "updatedAt": now(),
    })
}

/// Wire-shaped inventory transaction.
#[must_use]
pub fn transaction_json(id: Uuid, product_id: Uuid, movement: &str, quantity: u32) -> Value {
    json!({
        "id": id,
        "productId": product_id,
        "type": movement,
        "quantity": quantity,
        "reason": "Manual stock correction",
        "orderId": null,
        "createdAt": now(),
    })
}

/// Wire-shaped review.
#[must_use]
pub fn review_json(id: Uuid, product_id: Uuid, rating: u8, comment: &str) -> Value {
    json!({
        "id": id,
        "rating": rating,
        "comment": comment,
        "isVerifiedPurchase": true,
        "productId": product_id,
        "user": {
            "id": Uuid::new_v4(),
            "firstName": "Jane",
            "avatar": null,
        },
        "createdAt": now(),
        "updatedAt": now(),
    })
}
