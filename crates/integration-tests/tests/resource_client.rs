//! Resource-client behaviors observable through the stores: the 401
//! session-expiry hook and error normalization.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use inkbound_client::api::Method;

use inkbound_integration_tests::{init_tracing, mock_stores};

#[tokio::test]
async fn an_unexpected_401_fires_the_expiry_hook_and_still_rejects() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let expiries = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&expiries);
    stores.set_session_expired_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    mock.expect_failure(Method::Get, "/cart", 401, "Session expired");

    let err = stores.cart().load_cart().await.expect_err("rejected");
    assert_eq!(err.to_string(), "Session expired");
    assert_eq!(expiries.load(Ordering::SeqCst), 1, "hook fired exactly once");
}

#[tokio::test]
async fn a_401_from_login_does_not_fire_the_expiry_hook() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let expiries = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&expiries);
    stores.set_session_expired_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    mock.expect_failure(Method::Post, "/auth/login", 401, "Invalid credentials");

    let _ = stores
        .session()
        .login(inkbound_client::types::Credentials {
            email: "jane@example.com".to_owned(),
            password: "wrong".to_owned(),
        })
        .await;
    assert_eq!(expiries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transport_failures_surface_the_connection_message() {
    init_tracing();
    let (stores, mock) = mock_stores();
    mock.expect_network_error(Method::Get, "/cart");

    let err = stores.cart().load_cart().await.expect_err("network error");
    assert!(matches!(err, inkbound_client::api::ApiError::Network(_)));
    assert_eq!(
        stores.cart().error().as_deref(),
        Some("Network error. Please check your connection and try again.")
    );
}
