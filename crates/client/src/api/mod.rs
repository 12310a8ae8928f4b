//! Resource client for the storefront REST API.
//!
//! # Architecture
//!
//! - Every store talks to the server through [`ApiClient`], never through
//!   raw HTTP
//! - The server wraps successes in a `{status, data}` envelope; the client
//!   strips it, so stores only ever see payloads
//! - Failures are normalized into [`ApiError`] before they reach a store
//! - A 401 from any path except login/register/session-probe fires the
//!   registered session-expiry hook (the full-page-redirect effect in the
//!   embedding UI); the in-flight call still rejects normally
//!
//! The HTTP layer sits behind the object-safe [`Transport`] trait so the
//! stores can be driven by [`crate::testing::MockTransport`] in tests.

mod client;
mod http;

pub use client::ApiClient;
pub use http::HttpTransport;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Severity marker the server attaches to error responses.
///
/// `fail` is a rejected request (validation, policy); `error` is a server
/// fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Fail,
    Error,
}

/// A structured field error inside an error response.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldError {
    /// Path into the offending payload (strings and indices).
    #[serde(default)]
    pub path: Vec<Value>,
    pub message: String,
}

/// Normalized error body the server sends for rejected requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub status: ApiStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl ErrorBody {
    /// Fallback body for responses whose payload could not be parsed.
    #[must_use]
    pub fn from_http_status(status: u16) -> Self {
        Self {
            status: if status >= 500 {
                ApiStatus::Error
            } else {
                ApiStatus::Fail
            },
            message: Some(format!("HTTP {status}")),
            errors: Vec::new(),
        }
    }

    fn message_text(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "request failed".to_owned())
    }
}

/// Errors surfaced by the resource client.
///
/// Stores record the display message in their `error` slot and propagate
/// the typed value to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected client-side before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The server rejected the request with a structured body.
    #[error("{}", .0.message_text())]
    Resource(ErrorBody),

    /// No usable response was received.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not the JSON shape the contract promises.
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Message for the store's `error` slot, with the per-operation
    /// fallback used when the server sent no message of its own.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Resource(body) => body
                .message
                .clone()
                .unwrap_or_else(|| fallback.to_owned()),
            Self::Network(_) => {
                "Network error. Please check your connection and try again.".to_owned()
            }
            Self::Parse(_) => fallback.to_owned(),
        }
    }
}

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One file in a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name (e.g. `avatar`, `images`).
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A request as handed to the [`Transport`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Leading-slash path relative to the configured API base URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Non-empty turns the request into a multipart upload.
    pub files: Vec<FilePart>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            files: Vec::new(),
        }
    }
}

/// A response as returned by the [`Transport`]: the HTTP status plus the
/// parsed JSON body (`null` when the body was empty).
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

/// The wire boundary of the resource client.
///
/// Implemented by [`HttpTransport`] for real traffic and by
/// [`crate::testing::MockTransport`] in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request and return the raw status + JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] when no usable response arrives and
    /// [`ApiError::Parse`] when a success response is not JSON.
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_displays_the_server_message() {
        let err = ApiError::Resource(ErrorBody {
            status: ApiStatus::Fail,
            message: Some("Insufficient stock".to_owned()),
            errors: Vec::new(),
        });
        assert_eq!(err.to_string(), "Insufficient stock");
    }

    #[test]
    fn fallback_applies_only_when_the_server_sent_no_message() {
        let silent = ApiError::Resource(ErrorBody {
            status: ApiStatus::Error,
            message: None,
            errors: Vec::new(),
        });
        assert_eq!(silent.message_or("Failed to load products."), "Failed to load products.");

        let spoken = ApiError::Resource(ErrorBody {
            status: ApiStatus::Fail,
            message: Some("No such product".to_owned()),
            errors: Vec::new(),
        });
        assert_eq!(spoken.message_or("Failed to load products."), "No such product");
    }

    #[test]
    fn network_errors_use_the_connection_message() {
        let err = ApiError::Network("connection refused".to_owned());
        assert_eq!(
            err.message_or("anything"),
            "Network error. Please check your connection and try again."
        );
    }

    #[test]
    fn http_status_fallback_distinguishes_fail_from_error() {
        assert_eq!(ErrorBody::from_http_status(404).status, ApiStatus::Fail);
        assert_eq!(ErrorBody::from_http_status(502).status, ApiStatus::Error);
    }

    #[test]
    fn error_body_parses_with_and_without_details() {
        let full: ErrorBody = serde_json::from_value(serde_json::json!({
            "status": "fail",
            "message": "Validation failed",
            "errors": [{"path": ["email"], "message": "invalid email"}]
        }))
        .expect("parse");
        assert_eq!(full.errors.len(), 1);

        let bare: ErrorBody =
            serde_json::from_value(serde_json::json!({"status": "error"})).expect("parse");
        assert!(bare.message.is_none());
        assert!(bare.errors.is_empty());
    }
}
