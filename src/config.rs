//! Runtime configuration, read once at startup.
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file. Credentials are held as [`Secret`]s and never formatted.

use std::fmt;
use std::time::Duration;

use crate::error::PipelineError;
use crate::network::{
    DEFAULT_IMAGE_URL, DEFAULT_NEWS_URL, DEFAULT_PIN_FILE_URL, DEFAULT_PIN_JSON_URL,
};

pub const ENV_NEWS_KEY: &str = "NYT_API_KEY";
pub const ENV_RPC_URL: &str = "RPC_URL";
pub const ENV_PRIVATE_KEY: &str = "PRIVATE_KEY";
pub const ENV_CONTRACT_ADDRESS: &str = "CONTRACT_ADDRESS";
pub const ENV_PIN_TOKEN: &str = "PINATA_JWT";
pub const ENV_IMAGE_TOKEN: &str = "HF_TOKEN";
pub const ENV_RECEIPT_POLL_SECS: &str = "RECEIPT_POLL_SECS";

const DEFAULT_RECEIPT_POLL: Duration = Duration::from_secs(2);

// ─── Secret ──────────────────────────────────────────────────────────────────

/// A credential value. `Debug` and `Display` always print `***`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value. Only call this at the point of use.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ─── Endpoints ───────────────────────────────────────────────────────────────

/// Service URLs. Defaults point at the public services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub news_url: String,
    pub image_url: String,
    pub pin_file_url: String,
    pub pin_json_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            news_url: DEFAULT_NEWS_URL.to_string(),
            image_url: DEFAULT_IMAGE_URL.to_string(),
            pin_file_url: DEFAULT_PIN_FILE_URL.to_string(),
            pin_json_url: DEFAULT_PIN_JSON_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Every URL under a single base, keeping the default paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            news_url: format!("{}/svc/topstories/v2/home.json", base),
            image_url: format!("{}/hf-inference/models/black-forest-labs/FLUX.1-schnell", base),
            pin_file_url: format!("{}/pinning/pinFileToIPFS", base),
            pin_json_url: format!("{}/pinning/pinJSONToIPFS", base),
        }
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// News feed key. Checked at first use.
    pub news_api_key: Option<Secret>,
    /// Node RPC endpoint; provider URLs usually embed a key.
    pub rpc_url: Secret,
    pub private_key: Secret,
    pub contract_address: String,
    /// Pinning service JWT. Checked at first use.
    pub pin_token: Option<Secret>,
    /// Image service token. Checked at first use.
    pub image_token: Option<Secret>,
    pub endpoints: Endpoints,
    pub receipt_poll_interval: Duration,
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| PipelineError::config(format!("{} is not set", key)))
        };

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            news_url: get("NEWS_API_URL").unwrap_or(defaults.news_url),
            image_url: get("IMAGE_API_URL").unwrap_or(defaults.image_url),
            pin_file_url: get("PIN_FILE_URL").unwrap_or(defaults.pin_file_url),
            pin_json_url: get("PIN_JSON_URL").unwrap_or(defaults.pin_json_url),
        };

        let receipt_poll_interval = match get(ENV_RECEIPT_POLL_SECS) {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                PipelineError::config(format!("{} must be a whole number of seconds", ENV_RECEIPT_POLL_SECS))
            })?,
            None => DEFAULT_RECEIPT_POLL,
        };

        Ok(Self {
            news_api_key: get(ENV_NEWS_KEY).map(Secret::new),
            rpc_url: Secret::new(require(ENV_RPC_URL)?),
            private_key: Secret::new(require(ENV_PRIVATE_KEY)?),
            contract_address: require(ENV_CONTRACT_ADDRESS)?,
            pin_token: get(ENV_PIN_TOKEN).map(Secret::new),
            image_token: get(ENV_IMAGE_TOKEN).map(Secret::new),
            endpoints,
            receipt_poll_interval,
        })
    }
}

/// Resolve an optional credential at its point of use.
pub(crate) fn required_secret<'a>(
    secret: Option<&'a Secret>,
    name: &str,
) -> Result<&'a Secret, PipelineError> {
    secret.ok_or_else(|| PipelineError::config(format!("{} is missing", name)))
}
