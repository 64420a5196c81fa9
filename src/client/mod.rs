//! REST client for the back-office API.
//!
//! Wraps the handful of endpoints the inventory workflows need using
//! [`reqwest`]. The bearer token, when configured, is installed as a default
//! header so every outgoing request carries it.

pub mod envelope;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::AppConfig;
use crate::errors::{extract_error_message, ApiError};

pub use envelope::unwrap_envelope;

pub(crate) const PRODUCTS_PATH: &[&str] = &["products"];
pub(crate) const WAREHOUSES_PATH: &[&str] = &["warehouses"];
pub(crate) const STOCK_PATH: &[&str] = &["inventory", "stock"];
pub(crate) const INVENTORY_CHECKS_PATH: &[&str] = &["inventory-checks"];
pub(crate) const STOCK_INS_PATH: &[&str] = &["stock-ins"];

const USER_AGENT: &str = concat!("inventory-check/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client with its own connection pool.
    ///
    /// * `base_url` - API root, e.g. `https://shop.example.com/api/v1`.
    /// * `token` - bearer token attached to every request.
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ApiError::InvalidToken("token contains characters not allowed in a header".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Self::with_client(client, base_url)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.api_base_url,
            config.api_token.as_deref(),
            config.request_timeout(),
        )
    }

    /// Reuse an existing [`reqwest::Client`]. Default headers are whatever that
    /// client was built with.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments against the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        Self::parse_response(response).await
    }

    pub(crate) async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Turn a non-2xx response into [`ApiError::Status`], keeping the body and
    /// any structured message it carries.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: extract_error_message(&body),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok(unwrap_envelope(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, None, Duration::from_secs(5)).expect("client should build")
    }

    #[test]
    fn endpoint_joins_segments_with_and_without_trailing_slash() {
        let url = client("http://localhost:8080/api/v1")
            .endpoint(STOCK_PATH)
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v1/inventory/stock");

        let url = client("http://localhost:8080/api/v1/")
            .endpoint(INVENTORY_CHECKS_PATH)
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v1/inventory-checks");
    }

    #[test]
    fn endpoint_encodes_identifiers() {
        let url = client("http://localhost:8080")
            .endpoint(&["inventory", "stock", "SKU 1/2"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/inventory/stock/SKU%201%2F2");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        let err = ApiClient::new("not a url", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl(_)));

        let err = ApiClient::new("mailto:ops@example.com", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl(_)));
    }

    #[test]
    fn rejects_tokens_that_cannot_be_headers() {
        let err = ApiClient::new("http://localhost", Some("bad\ntoken"), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken(_)));
    }
}
