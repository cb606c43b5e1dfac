//! Hugging Face inference image generator with warm-up retries.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;

use crate::config::{required_secret, Secret, ENV_IMAGE_TOKEN};
use crate::error::PipelineResult;
use crate::http::client::{bearer, status_error};
use crate::http::retry::{retry_on_status, Attempt};
use crate::http::{Delay, HttpClient, RetryConfig, TimerDelay};

use super::{ImageAsset, ImageGenerator, Prompt};

const SERVICE_NAME: &str = "image service";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

pub struct HuggingFaceGenerator {
    http: HttpClient,
    url: String,
    token: Option<Secret>,
    retry: RetryConfig,
    delay: Arc<dyn Delay>,
}

impl HuggingFaceGenerator {
    /// Generator with the default warm-up policy and a real timer.
    pub fn new(http: HttpClient, url: impl Into<String>, token: Option<Secret>) -> Self {
        Self {
            http,
            url: url.into(),
            token,
            retry: RetryConfig::warm_up(),
            delay: Arc::new(TimerDelay),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }
}

impl HuggingFaceGenerator {
    /// One request, classified for the retry loop.
    async fn attempt(
        &self,
        attempt: u32,
        token: &Secret,
        body: &InferenceRequest<'_>,
    ) -> PipelineResult<Attempt<ImageAsset>> {
        tracing::debug!(attempt, "requesting image");
        let request = bearer(self.http.post(&self.url), token).json(body);
        let response = self.http.send_raw(request).await?;
        let status = response.status();

        // Other 2xx codes (202 queued, 204) carry no image.
        if status == StatusCode::OK {
            let header = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let bytes = response.bytes().await?;
            let asset = ImageAsset::from_response(bytes.to_vec(), header.as_deref())?;
            return Ok(Attempt::Done(asset));
        }

        if self.retry.is_retryable(status.as_u16()) {
            return Ok(Attempt::Retry {
                status: status.as_u16(),
            });
        }

        Err(status_error(response).await.into())
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceGenerator {
    async fn generate(&self, prompt: &Prompt) -> PipelineResult<ImageAsset> {
        let token = required_secret(self.token.as_ref(), ENV_IMAGE_TOKEN)?;
        let body = InferenceRequest {
            inputs: prompt.as_str(),
        };

        let asset = retry_on_status(&self.retry, self.delay.as_ref(), SERVICE_NAME, |n| {
            self.attempt(n, token, &body)
        })
        .await?;

        tracing::debug!(bytes = asset.len(), "image received");
        Ok(asset)
    }
}
