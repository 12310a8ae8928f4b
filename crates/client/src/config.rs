//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `INKBOUND_API_BASE_URL` - Base URL of the remote REST API
//!   (default: `http://localhost:3000/api`)
//! - `INKBOUND_API_TIMEOUT_SECS` - Per-request timeout in seconds
//!   (default: 30)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const BASE_URL_VAR: &str = "INKBOUND_API_BASE_URL";
const TIMEOUT_VAR: &str = "INKBOUND_API_TIMEOUT_SECS";

/// Default API base URL when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote REST API, including the `/api` prefix.
    pub api_base_url: Url,
    /// Per-request timeout applied by the HTTP transport.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var(BASE_URL_VAR).ok(),
            std::env::var(TIMEOUT_VAR).ok(),
        )
    }

    fn from_vars(base_url: Option<String>, timeout: Option<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let api_base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar(BASE_URL_VAR.to_owned(), e.to_string()))?;

        let timeout_secs = match timeout {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(TIMEOUT_VAR.to_owned(), e.to_string()))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Base URL as a string with no trailing slash, ready for path
    /// concatenation with the leading-slash paths the stores use.
    #[must_use]
    pub fn base_path(&self) -> String {
        self.api_base_url.as_str().trim_end_matches('/').to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ClientConfig::from_vars(None, None).expect("config");
        assert_eq!(config.api_base_url.as_str(), "http://localhost:3000/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = ClientConfig::from_vars(
            Some("https://shop.example.com/api".to_owned()),
            Some("5".to_owned()),
        )
        .expect("config");
        assert_eq!(config.base_path(), "https://shop.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let result = ClientConfig::from_vars(Some("not a url".to_owned()), None);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(var, _)) if var == BASE_URL_VAR));
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let result = ClientConfig::from_vars(None, Some("soon".to_owned()));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(var, _)) if var == TIMEOUT_VAR));
    }

    #[test]
    fn base_path_strips_trailing_slash() {
        let config = ClientConfig::from_vars(Some("http://localhost:9000/api/".to_owned()), None)
            .expect("config");
        assert_eq!(config.base_path(), "http://localhost:9000/api");
    }
}
