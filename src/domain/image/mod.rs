//! Image: prompt construction and the generated image asset.

pub mod client;

use async_trait::async_trait;

use crate::domain::headline::Headline;
use crate::error::{PipelineError, PipelineResult};

pub use client::HuggingFaceGenerator;

/// Style prefix applied to every headline before generation.
pub const PROMPT_STYLE: &str = "Professional digital art, newspaper aesthetic for: ";

/// Fallback when neither the bytes nor the response header identify the type.
pub const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// Text sent to the image service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn for_headline(headline: &Headline) -> Self {
        Self(format!("{}{}", PROMPT_STYLE, headline.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generated image bytes plus their content type. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    content_type: String,
}

impl ImageAsset {
    /// Build from a response body. The content type is sniffed from the
    /// bytes first, then taken from an `image/*` header, else PNG.
    pub fn from_response(bytes: Vec<u8>, header: Option<&str>) -> PipelineResult<Self> {
        if bytes.is_empty() {
            return Err(PipelineError::data("image service returned an empty body"));
        }
        let content_type = sniff_content_type(&bytes)
            .map(str::to_string)
            .or_else(|| {
                header
                    .map(|h| h.split(';').next().unwrap_or(h).trim().to_ascii_lowercase())
                    .filter(|h| h.starts_with("image/"))
            })
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        Ok(Self {
            bytes,
            content_type,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension for the content type.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

    if bytes.starts_with(PNG) {
        Some("image/png")
    } else if bytes.starts_with(JPEG) {
        Some("image/jpeg")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else {
        None
    }
}

/// Turns a prompt into an image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> PipelineResult<ImageAsset>;
}
