//! Typed request helpers over the transport.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiError, ApiRequest, ErrorBody, FilePart, HttpTransport, Method, Transport};
use crate::config::ClientConfig;

/// Paths whose 401 responses mean "these credentials are wrong" or "no
/// session yet", not "the session died" - they never trigger the
/// session-expiry hook.
const SESSION_EXEMPT_SUFFIXES: &[&str] = &["/auth/login", "/auth/register", "/auth/me"];

type SessionExpiredHook = Box<dyn Fn() + Send + Sync>;

/// Client for the storefront REST API.
///
/// Cheaply cloneable; every store holds one. Success envelopes are
/// unwrapped and failures normalized before a result reaches a store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    transport: Box<dyn Transport>,
    on_session_expired: RwLock<Option<SessionExpiredHook>>,
}

/// Success envelope, parsed leniently: `data` may be absent or `null`
/// for void operations.
#[derive(serde::Deserialize)]
struct RawEnvelope {
    #[allow(dead_code)]
    status: String,
    #[serde(default)]
    data: Value,
}

impl ApiClient {
    /// Create a client backed by the real HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::with_transport(Box::new(HttpTransport::new(config)?)))
    }

    /// Create a client over an arbitrary transport (tests use
    /// [`crate::testing::MockTransport`]).
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                transport,
                on_session_expired: RwLock::new(None),
            }),
        }
    }

    /// Register the hook fired on an unexpected 401.
    ///
    /// In the embedding UI this performs the full-page navigation to the
    /// login screen; stores in flight at that moment still see their own
    /// rejection.
    pub fn set_session_expired_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self
            .inner
            .on_session_expired
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
    }

    /// GET a resource.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.dispatch(ApiRequest::new(Method::Get, path)).await
    }

    /// GET a resource with query parameters.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut request = ApiRequest::new(Method::Get, path);
        request.query = query
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect();
        self.dispatch(request).await
    }

    /// POST a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut request = ApiRequest::new(Method::Post, path);
        request.body = Some(serde_json::to_value(body)?);
        self.dispatch(request).await
    }

    /// POST with no body.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.dispatch(ApiRequest::new(Method::Post, path)).await
    }

    /// PUT a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut request = ApiRequest::new(Method::Put, path);
        request.body = Some(serde_json::to_value(body)?);
        self.dispatch(request).await
    }

    /// DELETE a resource.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.dispatch(ApiRequest::new(Method::Delete, path)).await
    }

    /// POST files as a multipart form.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        files: Vec<FilePart>,
    ) -> Result<T, ApiError> {
        let mut request = ApiRequest::new(Method::Post, path);
        request.files = files;
        self.dispatch(request).await
    }

    async fn dispatch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        debug!(?method, %path, "dispatching request");

        let response = self.inner.transport.execute(request).await?;

        if response.status >= 400 {
            let body = serde_json::from_value::<ErrorBody>(response.body)
                .unwrap_or_else(|_| ErrorBody::from_http_status(response.status));
            if response.status == 401 && !is_session_exempt(&path) {
                warn!(%path, "session expired, notifying embedder");
                self.fire_session_expired();
            } else {
                debug!(%path, status = response.status, "request rejected");
            }
            return Err(ApiError::Resource(body));
        }

        let envelope: RawEnvelope = serde_json::from_value(response.body)?;
        Ok(serde_json::from_value(envelope.data)?)
    }

    fn fire_session_expired(&self) {
        let guard = self
            .inner
            .on_session_expired
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(hook) = guard.as_ref() {
            hook();
        }
    }
}

fn is_session_exempt(path: &str) -> bool {
    SESSION_EXEMPT_SUFFIXES
        .iter()
        .any(|suffix| path.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoints_are_exempt_from_the_expiry_hook() {
        assert!(is_session_exempt("/auth/login"));
        assert!(is_session_exempt("/auth/register"));
        assert!(is_session_exempt("/auth/me"));
        assert!(!is_session_exempt("/cart"));
        assert!(!is_session_exempt("/order/admin/all"));
    }
}
