//! Shared HTTP client used by the headline, image and pinning stages.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::Secret;
use crate::error::{PipelineError, TransportError};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in a [`TransportError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Thin wrapper over `reqwest::Client` with uniform status handling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, PipelineError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send without inspecting the status. Callers that classify statuses
    /// themselves (the image retry loop) use this.
    pub async fn send_raw(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        Ok(request.send().await?)
    }

    /// Send and fail on any non-2xx status.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = self.send_raw(request).await?;
        error_for_status(response).await
    }

    /// Send, fail on non-2xx, decode the JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Attach `Authorization: Bearer <token>`.
pub fn bearer(request: RequestBuilder, token: &Secret) -> RequestBuilder {
    request.bearer_auth(token.expose())
}

/// Turn a non-2xx response into [`TransportError::Status`].
pub async fn error_for_status(response: Response) -> Result<Response, TransportError> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(status_error(response).await)
}

/// Consume a response into [`TransportError::Status`], keeping a bounded
/// prefix of its body.
pub async fn status_error(response: Response) -> TransportError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    TransportError::Status {
        status,
        body: truncate(&body, MAX_ERROR_BODY),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
