//! HTTP transport backed by `reqwest`.
//!
//! Session persistence is a server-side cookie; the cookie store keeps it
//! attached to every request, so nothing in this layer knows about auth.

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use super::{ApiError, ApiRequest, Method, RawResponse, Transport};
use crate::config::ClientConfig;

/// Real-network [`Transport`] implementation.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the `reqwest` client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_path(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        if !request.files.is_empty() {
            let mut form = reqwest::multipart::Form::new();
            for file in request.files {
                let part = reqwest::multipart::Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)
                    .map_err(|e| ApiError::Validation(format!("invalid content type: {e}")))?;
                form = form.part(file.field, part);
            }
            builder = builder.multipart(form);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                // Error pages are often not JSON; the client falls back to
                // an HTTP-status error body.
                Err(_) if status >= 400 => Value::Null,
                Err(err) => {
                    error!(
                        status,
                        body = %text.chars().take(500).collect::<String>(),
                        "response body is not JSON"
                    );
                    return Err(ApiError::Parse(err));
                }
            }
        };

        Ok(RawResponse { status, body })
    }
}
