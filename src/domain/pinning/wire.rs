//! Wire types for the pinning service.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PinOptions {
    #[serde(rename = "cidVersion")]
    pub cid_version: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PinMetadata {
    pub name: String,
}

/// Body of a JSON pin request.
#[derive(Debug, Serialize)]
pub struct PinJsonRequest<'a, T: Serialize> {
    #[serde(rename = "pinataOptions")]
    pub options: PinOptions,
    #[serde(rename = "pinataMetadata")]
    pub metadata: PinMetadata,
    #[serde(rename = "pinataContent")]
    pub content: &'a T,
}

/// Response to both pin endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PinResponse {
    #[serde(rename = "IpfsHash", default)]
    pub ipfs_hash: Option<String>,
    #[serde(rename = "PinSize", default)]
    pub pin_size: Option<u64>,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
}
