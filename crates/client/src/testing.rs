//! Test support: an in-memory [`Transport`] with scripted responses.
//!
//! Tests queue expectations in the order the code under test will issue
//! requests, hand a clone of the mock to [`crate::stores::Stores`], and
//! assert on the recorded traffic afterwards. An expectation may carry a
//! delay so interleavings (out-of-order responses, fencing) can be
//! reproduced deterministically under `tokio::time::pause`.
//!
//! # Example
//!
//! ```rust,ignore
//! let mock = MockTransport::new();
//! mock.expect_success(Method::Get, "/cart", json!({"cart": cart}));
//!
//! let stores = Stores::with_transport(Box::new(mock.clone()));
//! stores.cart().load_cart().await?;
//!
//! assert_eq!(mock.requests().len(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::{ApiError, ApiRequest, Method, RawResponse, Transport};

#[derive(Debug)]
struct Expectation {
    method: Method,
    path: String,
    delay: Option<Duration>,
    outcome: Outcome,
}

#[derive(Debug)]
enum Outcome {
    Respond(RawResponse),
    NetworkError,
}

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub file_count: usize,
}

/// Scripted [`Transport`] for store tests.
///
/// Clones share the same expectation queue and request log, so a test
/// can keep one handle while the stores own the other.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    expectations: Mutex<VecDeque<Expectation>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a success envelope (`{status: "success", data}`).
    pub fn expect_success(&self, method: Method, path: &str, data: Value) {
        self.push(method, path, None, success_response(data));
    }

    /// Queue a success envelope delivered after `delay`.
    ///
    /// Under a paused tokio clock the delay is virtual; use distinct
    /// delays to force a chosen resolution order across overlapping
    /// requests.
    pub fn expect_success_after(&self, method: Method, path: &str, delay: Duration, data: Value) {
        self.push(method, path, Some(delay), success_response(data));
    }

    /// Queue a rejection with the given HTTP status and message.
    pub fn expect_failure(&self, method: Method, path: &str, status: u16, message: &str) {
        let marker = if status >= 500 { "error" } else { "fail" };
        self.push(
            method,
            path,
            None,
            Outcome::Respond(RawResponse {
                status,
                body: json!({"status": marker, "message": message}),
            }),
        );
    }

    /// Queue a transport-level failure (no response at all).
    pub fn expect_network_error(&self, method: Method, path: &str) {
        self.push(method, path, None, Outcome::NetworkError);
    }

    fn push(&self, method: Method, path: &str, delay: Option<Duration>, outcome: Outcome) {
        lock(&self.inner.expectations).push_back(Expectation {
            method,
            path: path.to_owned(),
            delay,
            outcome,
        });
    }

    /// Everything the stores sent, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.inner.requests).clone()
    }

    /// Number of queued expectations not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.inner.expectations).len()
    }
}

fn success_response(data: Value) -> Outcome {
    Outcome::Respond(RawResponse {
        status: 200,
        body: json!({"status": "success", "data": data}),
    })
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        lock(&self.inner.requests).push(RecordedRequest {
            method: request.method,
            path: request.path.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            file_count: request.files.len(),
        });

        let expectation = lock(&self.inner.expectations).pop_front().unwrap_or_else(|| {
            panic!(
                "unexpected request: {:?} {} (no expectation queued)",
                request.method, request.path
            )
        });

        assert_eq!(
            (expectation.method, expectation.path.as_str()),
            (request.method, request.path.as_str()),
            "request did not match the next queued expectation",
        );

        if let Some(delay) = expectation.delay {
            tokio::time::sleep(delay).await;
        }

        match expectation.outcome {
            Outcome::Respond(response) => Ok(response),
            Outcome::NetworkError => Err(ApiError::Network("connection reset".to_owned())),
        }
    }
}
