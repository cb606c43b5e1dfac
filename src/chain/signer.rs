//! Local secp256k1 signing account.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::config::Secret;
use crate::error::PipelineError;

use super::primitives::{keccak256, Address};

/// Recoverable signature split into its transaction fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub y_parity: u8,
}

/// Holds the private key. `Debug` shows only the address.
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Parse a 32-byte hex key, with or without `0x`. Errors never echo the input.
    pub fn from_secret(secret: &Secret) -> Result<Self, PipelineError> {
        let raw = secret.expose().trim();
        let digits = raw.strip_prefix("0x").unwrap_or(raw);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| PipelineError::config("PRIVATE_KEY must be 32 bytes of hex"))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| PipelineError::config("PRIVATE_KEY is not a valid secp256k1 key"))?;
        Ok(Self::from_key(key))
    }

    fn from_key(key: SigningKey) -> Self {
        let address = address_of(&key);
        Self { key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehash. The signature is low-s normalized.
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<RecoverableSignature, PipelineError> {
        let (signature, recovery_id): (Signature, RecoveryId) = self
            .key
            .sign_prehash_recoverable(hash)
            .map_err(|e| PipelineError::config(format!("signing failed: {}", e)))?;
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(RecoverableSignature {
            r,
            s,
            y_parity: recovery_id.to_byte(),
        })
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address.to_checksum())
            .finish_non_exhaustive()
    }
}

fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}
