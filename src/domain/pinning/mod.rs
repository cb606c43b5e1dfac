//! Pinning: locators and the token metadata record.

pub mod client;
pub mod wire;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

pub use client::PinataPinner;

/// Scheme prefix of every locator.
pub const LOCATOR_SCHEME: &str = "ipfs://";

/// Content-address reference, `ipfs://<hash>` with the hash exactly as the
/// pinning service assigned it.
///
/// Deserialization goes through the same validation as [`Locator::from_hash`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator(String);

impl Locator {
    /// Wrap a remote-assigned content hash. Empty hashes are rejected.
    pub fn from_hash(hash: &str) -> PipelineResult<Self> {
        if hash.is_empty() {
            return Err(PipelineError::data("pinning service returned an empty hash"));
        }
        Ok(Self(format!("{}{}", LOCATOR_SCHEME, hash)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The content hash without the scheme.
    pub fn hash(&self) -> &str {
        self.0.strip_prefix(LOCATOR_SCHEME).unwrap_or(&self.0)
    }
}

impl TryFrom<String> for Locator {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.strip_prefix(LOCATOR_SCHEME) {
            Some(hash) => Self::from_hash(hash),
            None => Err(PipelineError::data(format!(
                "locator must start with {}",
                LOCATOR_SCHEME
            ))),
        }
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.0
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token metadata record pinned once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub image: Locator,
}

/// Uploads payloads to the content-addressed store.
#[async_trait]
pub trait ContentPinner: Send + Sync {
    async fn pin_binary(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> PipelineResult<Locator>;

    async fn pin_json(&self, record: &Metadata, filename: &str) -> PipelineResult<Locator>;
}
