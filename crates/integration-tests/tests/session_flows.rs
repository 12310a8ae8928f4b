//! Session store scenarios: probe latch, auth flows, admin user list.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use inkbound_client::api::Method;
use inkbound_client::types::{Credentials, ProfilePatch, RegisterPayload, UserAdminPatch};
use inkbound_core::UserId;
use serde_json::json;
use uuid::Uuid;

use inkbound_integration_tests::{init_tracing, mock_stores, user_json};

fn register_payload(password: &str, confirm: &str) -> RegisterPayload {
    RegisterPayload {
        first_name: "Jane".to_owned(),
        last_name: "Reader".to_owned(),
        email: "jane@example.com".to_owned(),
        password: password.to_owned(),
        confirm_password: confirm.to_owned(),
    }
}

#[tokio::test]
async fn session_probe_runs_at_most_once() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    mock.expect_success(
        Method::Get,
        "/auth/me",
        json!({"user": user_json(user_id, "Jane", "buyer")}),
    );

    let first = stores.session().check_session().await;
    assert_eq!(first.map(|u| u.id), Some(UserId::new(user_id)));

    // A second mounting component probes again; no request goes out.
    let second = stores.session().check_session().await;
    assert_eq!(second.map(|u| u.id), Some(UserId::new(user_id)));
    assert_eq!(mock.requests().len(), 1);
    assert!(!stores.session().is_loading());
}

#[tokio::test]
async fn anonymous_probe_is_silent_and_fires_no_expiry_hook() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let expiries = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&expiries);
    stores.set_session_expired_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    mock.expect_failure(Method::Get, "/auth/me", 401, "Not logged in");

    let user = stores.session().check_session().await;
    assert!(user.is_none());
    assert!(stores.session().error().is_none(), "anonymity is not an error");
    assert!(!stores.session().is_authenticated());
    assert_eq!(expiries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn login_success_sets_the_user() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    mock.expect_success(
        Method::Post,
        "/auth/login",
        json!({"user": user_json(user_id, "Jane", "buyer")}),
    );

    let user = stores
        .session()
        .login(Credentials {
            email: "jane@example.com".to_owned(),
            password: "correct horse".to_owned(),
        })
        .await
        .expect("login");
    assert_eq!(user.id, UserId::new(user_id));
    assert!(stores.session().is_authenticated());
    assert!(!stores.session().is_loading());
}

#[tokio::test]
async fn login_rejection_records_the_server_message() {
    init_tracing();
    let (stores, mock) = mock_stores();
    mock.expect_failure(Method::Post, "/auth/login", 401, "Invalid credentials");

    let err = stores
        .session()
        .login(Credentials {
            email: "jane@example.com".to_owned(),
            password: "wrong".to_owned(),
        })
        .await
        .expect_err("rejected");
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(stores.session().error().as_deref(), Some("Invalid credentials"));
    assert!(!stores.session().is_authenticated());
    assert!(!stores.session().is_loading());
}

#[tokio::test]
async fn mismatched_registration_makes_no_request() {
    init_tracing();
    let (stores, mock) = mock_stores();

    let err = stores
        .session()
        .register(register_payload("correct horse", "battery staple"))
        .await
        .expect_err("mismatch");
    assert!(matches!(err, inkbound_client::api::ApiError::Validation(_)));
    assert!(mock.requests().is_empty());
    assert_eq!(
        stores.session().error().as_deref(),
        Some("Passwords do not match. Please try again.")
    );
}

#[tokio::test]
async fn registration_strips_the_confirmation_field() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    mock.expect_success(
        Method::Post,
        "/auth/register",
        json!({"user": user_json(user_id, "Jane", "buyer")}),
    );

    stores
        .session()
        .register(register_payload("correct horse", "correct horse"))
        .await
        .expect("register");

    let requests = mock.requests();
    let body = requests[0].body.as_ref().expect("body");
    assert!(body.get("confirmPassword").is_none());
    assert_eq!(body["email"], "jane@example.com");
}

#[tokio::test]
async fn logout_clears_the_user_even_when_the_server_rejects() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    mock.expect_success(
        Method::Post,
        "/auth/login",
        json!({"user": user_json(user_id, "Jane", "buyer")}),
    );
    mock.expect_failure(Method::Post, "/auth/logout", 500, "session backend down");

    stores
        .session()
        .login(Credentials {
            email: "jane@example.com".to_owned(),
            password: "correct horse".to_owned(),
        })
        .await
        .expect("login");

    // Subscribing here, after login, means the first event received
    // below can only be the logout's SessionEnded.
    let mut events = stores.events().subscribe();

    let result = stores.session().logout().await;
    assert!(result.is_err());
    assert!(stores.session().current_user().is_none());
    assert!(!stores.session().is_authenticated());
    assert_eq!(
        events.recv().await.expect("event"),
        inkbound_client::events::StoreEvent::SessionEnded
    );
}

#[tokio::test]
async fn profile_update_replaces_the_user_in_place() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let user_id = Uuid::new_v4();
    mock.expect_success(
        Method::Post,
        "/auth/login",
        json!({"user": user_json(user_id, "Jane", "buyer")}),
    );
    mock.expect_success(
        Method::Put,
        "/auth/me",
        json!({"user": user_json(user_id, "Janet", "buyer")}),
    );

    stores
        .session()
        .login(Credentials {
            email: "jane@example.com".to_owned(),
            password: "correct horse".to_owned(),
        })
        .await
        .expect("login");

    let updated = stores
        .session()
        .update_profile(ProfilePatch {
            first_name: Some("Janet".to_owned()),
            last_name: None,
        })
        .await
        .expect("update");
    assert_eq!(updated.first_name, "Janet");
    assert_eq!(
        stores.session().current_user().map(|u| u.first_name),
        Some("Janet".to_owned())
    );
}

#[tokio::test]
async fn admin_user_update_patches_exactly_one_row() {
    init_tracing();
    let (stores, mock) = mock_stores();
    let keep_id = Uuid::new_v4();
    let flip_id = Uuid::new_v4();
    mock.expect_success(
        Method::Get,
        "/auth/admin/users",
        json!({
            "users": [user_json(keep_id, "Jane", "buyer"), user_json(flip_id, "John", "buyer")],
            "totalUsers": 2,
            "totalPages": 1,
            "currentPage": 1,
        }),
    );
    let mut deactivated = user_json(flip_id, "John", "buyer");
    deactivated["isActive"] = json!(false);
    mock.expect_success(
        Method::Put,
        &format!("/auth/admin/users/{flip_id}"),
        json!({"user": deactivated}),
    );

    stores
        .session()
        .fetch_all_users(Some(1), Some(20))
        .await
        .expect("fetch users");

    stores
        .session()
        .update_user_as_admin(
            UserId::new(flip_id),
            UserAdminPatch {
                is_active: Some(false),
            },
        )
        .await
        .expect("update");

    let page = stores.session().all_users().expect("page");
    assert_eq!(page.total, 2);
    let kept = page
        .items
        .iter()
        .find(|u| u.id == UserId::new(keep_id))
        .expect("kept row");
    assert!(kept.is_active, "untouched row must stay untouched");
    let flipped = page
        .items
        .iter()
        .find(|u| u.id == UserId::new(flip_id))
        .expect("patched row");
    assert!(!flipped.is_active);
}
