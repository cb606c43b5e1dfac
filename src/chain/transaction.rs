//! EIP-1559 (type 2) transaction construction and signing.

use crate::error::PipelineResult;

use super::primitives::{keccak256, Address, TxHash};
use super::rlp::{self, Item};
use super::signer::{LocalSigner, RecoverableSignature};

/// Typed-envelope tag for dynamic-fee transactions.
pub const EIP1559_TX_TYPE: u8 = 0x02;

/// Gas cap for the token URI update.
pub const GAS_LIMIT: u64 = 200_000;

/// Fee fields derived from the node's current gas price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl Fees {
    /// Max fee at twice the current price, priority fee at the price itself.
    pub fn from_gas_price(gas_price: u128) -> Self {
        Self {
            max_fee_per_gas: gas_price.saturating_mul(2),
            max_priority_fee_per_gas: gas_price,
        }
    }
}

/// Unsigned dynamic-fee transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub fees: Fees,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

impl Eip1559Transaction {
    fn fields(&self) -> Vec<Item> {
        vec![
            Item::uint(self.chain_id as u128),
            Item::uint(self.nonce as u128),
            Item::uint(self.fees.max_priority_fee_per_gas),
            Item::uint(self.fees.max_fee_per_gas),
            Item::uint(self.gas_limit as u128),
            Item::bytes(self.to.as_bytes()),
            Item::uint(self.value),
            Item::bytes(&self.data),
            Item::List(Vec::new()), // access list
        ]
    }

    /// `0x02 || rlp(fields)`
    pub fn signing_payload(&self) -> Vec<u8> {
        typed(rlp::encode(&Item::List(self.fields())))
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    /// `0x02 || rlp(fields ++ [y_parity, r, s])`
    pub fn encode_signed(&self, signature: &RecoverableSignature) -> Vec<u8> {
        let mut fields = self.fields();
        fields.push(Item::uint(signature.y_parity as u128));
        fields.push(Item::uint_bytes(&signature.r));
        fields.push(Item::uint_bytes(&signature.s));
        typed(rlp::encode(&Item::List(fields)))
    }

    /// Sign, consuming the unsigned transaction.
    pub fn sign(self, signer: &LocalSigner) -> PipelineResult<SignedTransaction> {
        let signature = signer.sign_hash(&self.signing_hash())?;
        let raw = self.encode_signed(&signature);
        let hash = TxHash::from_bytes(keccak256(&raw));
        Ok(SignedTransaction {
            nonce: self.nonce,
            raw,
            hash,
        })
    }
}

fn typed(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 1);
    out.push(EIP1559_TX_TYPE);
    out.extend_from_slice(&payload);
    out
}

/// Signed, broadcast-ready transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub nonce: u64,
    pub raw: Vec<u8>,
    /// Keccak-256 of `raw`.
    pub hash: TxHash,
}
