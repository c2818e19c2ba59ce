//! ==============================================================================
//! client.rs - http transport for the aqms api
//! ==============================================================================
//!
//! purpose:
//!     thin async wrapper over reqwest. builds urls, drops absent query
//!     params, and routes every response through normalize.rs so callers
//!     only ever see typed values or an `ApiError`.
//!
//! relationships:
//!     - used by: service.rs (one method per endpoint)
//!     - uses: normalize.rs (body parsing, envelope unwrapping, error mapping)
//!
//! ==============================================================================

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::ApiError;
use super::normalize::{decode, error_from_response, read_body, Shape};

/// query parameters; `None` values are left out of the url
pub type Params<'a> = [(&'a str, Option<String>)];

/// AQMS API client (async).
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("aqms-dashboard/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(format!("failed to create http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &Params<'_>,
        shape: Shape,
    ) -> Result<T, ApiError> {
        tracing::debug!(endpoint, "GET");
        let response = self
            .http
            .get(self.url(endpoint))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .query(&present(params))
            .send()
            .await?;

        let body = read_json(response).await?;
        decode(body, shape)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
        shape: Shape,
    ) -> Result<T, ApiError> {
        tracing::debug!(endpoint, "PUT");
        let response = self.http.put(self.url(endpoint)).json(body).send().await?;

        let body = read_json(response).await?;
        decode(body, shape)
    }

    /// Fetches a file. Bypasses envelope handling entirely.
    pub async fn download(&self, endpoint: &str, params: &Params<'_>) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(endpoint, "GET (download)");
        let response = self
            .http
            .get(self.url(endpoint))
            .query(&present(params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError {
                message: format!("Failed to download: {}", status_text(status)),
                status: Some(status.as_u16()),
                code: None,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

fn present<'a>(params: &'a Params<'_>) -> Vec<(&'a str, &'a str)> {
    params
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
        .collect()
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

async fn read_json(response: Response) -> Result<serde_json::Value, ApiError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    // a body that cannot be read is treated like an empty one
    let bytes = response.bytes().await.unwrap_or_default();

    if !status.is_success() {
        let err = error_from_response(status.as_u16(), status_text(status), &bytes);
        tracing::warn!(status = status.as_u16(), code = ?err.code, "request failed: {}", err.message);
        return Err(err);
    }

    Ok(read_body(content_type.as_deref(), &bytes))
}
