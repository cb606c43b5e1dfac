//! Pinata pinning client.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::config::{required_secret, Secret, ENV_PIN_TOKEN};
use crate::error::{PipelineError, PipelineResult};
use crate::http::client::bearer;
use crate::http::HttpClient;

use super::wire::{PinJsonRequest, PinMetadata, PinOptions, PinResponse};
use super::{ContentPinner, Locator, Metadata};

/// CID version requested for JSON pins.
const CID_VERSION: u8 = 1;

/// One token shared by both upload endpoints. No retries.
pub struct PinataPinner {
    http: HttpClient,
    file_url: String,
    json_url: String,
    token: Option<Secret>,
}

impl PinataPinner {
    pub fn new(
        http: HttpClient,
        file_url: impl Into<String>,
        json_url: impl Into<String>,
        token: Option<Secret>,
    ) -> Self {
        Self {
            http,
            file_url: file_url.into(),
            json_url: json_url.into(),
            token,
        }
    }

    fn token(&self) -> PipelineResult<&Secret> {
        required_secret(self.token.as_ref(), ENV_PIN_TOKEN)
    }
}

fn locator_from(response: PinResponse) -> PipelineResult<Locator> {
    let hash = response
        .ipfs_hash
        .ok_or_else(|| PipelineError::data("pin response has no IpfsHash"))?;
    Locator::from_hash(&hash)
}

#[async_trait]
impl ContentPinner for PinataPinner {
    async fn pin_binary(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> PipelineResult<Locator> {
        let token = self.token()?;
        let part = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        let request = bearer(self.http.post(&self.file_url), token).multipart(form);
        let response: PinResponse = self.http.send_json(request).await?;
        let locator = locator_from(response)?;
        tracing::debug!(%locator, filename, "file pinned");
        Ok(locator)
    }

    async fn pin_json(&self, record: &Metadata, filename: &str) -> PipelineResult<Locator> {
        let token = self.token()?;
        let body = PinJsonRequest {
            options: PinOptions {
                cid_version: CID_VERSION,
            },
            metadata: PinMetadata {
                name: filename.to_string(),
            },
            content: record,
        };

        let request = bearer(self.http.post(&self.json_url), token).json(&body);
        let response: PinResponse = self.http.send_json(request).await?;
        let locator = locator_from(response)?;
        tracing::debug!(%locator, filename, "json pinned");
        Ok(locator)
    }
}
