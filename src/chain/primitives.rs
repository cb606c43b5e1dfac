//! Chain primitives: Keccak hashing, addresses, transaction hashes, quantities.

use std::fmt;
use std::str::FromStr;

use sha3::{Digest, Keccak256};

use crate::error::{PipelineError, TransportError};

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

// ─── Address ─────────────────────────────────────────────────────────────────

/// 20-byte account or contract address. Displays EIP-55 checksummed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case hex.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = PipelineError;

    /// Accepts all-lowercase or all-uppercase hex, or mixed case with a
    /// valid EIP-55 checksum.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| PipelineError::config("address must start with 0x"))?;
        if digits.len() != 40 {
            return Err(PipelineError::config("address must be 20 bytes (40 hex digits)"));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| PipelineError::config("address is not valid hex"))?;
        let address = Address(bytes);

        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *digits {
            return Err(PipelineError::config("address checksum mismatch"));
        }
        Ok(address)
    }
}

// ─── TxHash ──────────────────────────────────────────────────────────────────

/// 32-byte transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for TxHash {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| TransportError::Decode(format!("hash without 0x prefix: {}", s)))?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| TransportError::Decode(format!("invalid 32-byte hash: {}", s)))?;
        Ok(TxHash(bytes))
    }
}

// ─── Quantities ──────────────────────────────────────────────────────────────

/// Parse a JSON-RPC hex quantity (`"0x1a"`).
pub fn parse_quantity(s: &str) -> Result<u128, TransportError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| TransportError::Decode(format!("quantity without 0x prefix: {}", s)))?;
    if digits.is_empty() {
        return Err(TransportError::Decode("empty quantity".to_string()));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|_| TransportError::Decode(format!("invalid quantity: {}", s)))
}

/// Hex-encode arbitrary bytes with a `0x` prefix.
pub fn hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
