//! HTTP client for the credits feed
//!
//! Performs a single timed GET and parses the body as untyped JSON. Callers
//! get a typed [`CreditsError`] back; deciding what a failure means is left
//! to [`Credits`](super::Credits).

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Product name sent in the `User-Agent` header
pub const PRODUCT_NAME: &str = "cachet";

/// Connect and total timeout for the credits request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when fetching the credits feed
#[derive(Debug, Error)]
pub enum CreditsError {
    /// HTTP request failed, including connect failures and timeouts
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Unexpected HTTP status: {0}")]
    Status(StatusCode),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Builds the `User-Agent` value: `cachet/<version>`, or bare `cachet`
pub fn user_agent(product_version: Option<&str>) -> String {
    match product_version {
        Some(version) if !version.is_empty() => format!("{}/{}", PRODUCT_NAME, version),
        _ => PRODUCT_NAME.to_string(),
    }
}

/// Client for fetching the credits JSON document
#[derive(Debug, Clone)]
pub struct CreditsClient {
    client: Client,
    url: String,
}

impl CreditsClient {
    /// Create a client for `url` with the given `User-Agent` and timeout
    ///
    /// The timeout bounds both connection setup and the whole request.
    pub fn new(
        url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, CreditsError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// URL the client requests
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the credits document
    ///
    /// # Returns
    /// * `Ok(Value)` - The parsed JSON body of a 2xx response
    /// * `Err(CreditsError)` - On transport failure, timeout, non-2xx status or malformed JSON
    pub async fn fetch(&self) -> Result<Value, CreditsError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CreditsError::Status(status));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_with_version() {
        assert_eq!(user_agent(Some("2.4.0")), "cachet/2.4.0");
    }

    #[test]
    fn test_user_agent_without_version() {
        assert_eq!(user_agent(None), "cachet");
        assert_eq!(user_agent(Some("")), "cachet");
    }

    #[test]
    fn test_client_keeps_url() {
        let client = CreditsClient::new("http://localhost/credits", "cachet", DEFAULT_TIMEOUT)
            .expect("Client should build");
        assert_eq!(client.url(), "http://localhost/credits");
    }

    #[test]
    fn test_status_error_message() {
        let err = CreditsError::Status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_parse_error_from_malformed_json() {
        let err: CreditsError = serde_json::from_str::<Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, CreditsError::ParseError(_)));
    }
}
