//! Oracle adapter client.

use std::time::Duration;

use async_trait::async_trait;
use knowton_traits::{TraitError, ValuationEstimate, ValuationOracle, ValuationRequest};
use reqwest::{Client, StatusCode};

/// Valuation endpoint, relative to the base URL.
pub const VALUATION_PATH: &str = "/api/v1/oracle/valuation";

/// Health endpoint, relative to the base URL.
pub const HEALTH_PATH: &str = "/health";

/// Longest response body excerpt carried in an error.
const MAX_ERROR_BODY: usize = 256;

/// [`ValuationOracle`] backed by the oracle adapter's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpValuationOracle {
    client: Client,
    base_url: String,
}

impl HttpValuationOracle {
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TraitError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(TraitError::InvalidInput("oracle base URL is empty".into()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraitError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ValuationOracle for HttpValuationOracle {
    async fn valuate(&self, request: &ValuationRequest) -> Result<ValuationEstimate, TraitError> {
        let url = self.url(VALUATION_PATH);
        tracing::debug!(token_id = request.token_id, %url, "Requesting valuation");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        parse_estimate(&body)
    }

    async fn health_check(&self) -> Result<(), TraitError> {
        let response = self
            .client
            .get(self.url(HEALTH_PATH))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.bytes().await.unwrap_or_default();
            Err(status_error(status, &body))
        }
    }
}

/// Decodes a valuation response body.
///
/// Unknown fields are ignored; the interval arrives as a two-element array.
pub(crate) fn parse_estimate(body: &[u8]) -> Result<ValuationEstimate, TraitError> {
    serde_json::from_slice(body)
        .map_err(|e| TraitError::ParseError(format!("invalid valuation response: {e}")))
}

/// Maps a non-success status to a [`TraitError`].
pub(crate) fn status_error(status: StatusCode, body: &[u8]) -> TraitError {
    let text = String::from_utf8_lossy(body);
    let excerpt: String = text.chars().take(MAX_ERROR_BODY).collect();
    let message = format!("oracle returned {status}: {excerpt}");

    if status == StatusCode::TOO_MANY_REQUESTS {
        TraitError::RateLimited
    } else if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        TraitError::Timeout
    } else if status == StatusCode::NOT_FOUND {
        TraitError::NotFound(message)
    } else if status.is_server_error() {
        TraitError::ConnectionFailed(message)
    } else {
        TraitError::InvalidInput(message)
    }
}

fn transport_error(e: reqwest::Error) -> TraitError {
    if e.is_timeout() {
        TraitError::Timeout
    } else if e.is_connect() || e.is_request() {
        TraitError::ConnectionFailed(e.to_string())
    } else if e.is_decode() || e.is_body() {
        TraitError::ParseError(e.to_string())
    } else {
        TraitError::Internal(e.to_string())
    }
}
