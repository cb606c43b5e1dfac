//! Minimal contract ABI: the one callable the pipeline needs.

use super::primitives::{keccak256, Address};

/// ABI word size.
const WORD: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMutability {
    NonPayable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
}

impl ParamType {
    fn canonical(&self) -> &'static str {
        match self {
            ParamType::String => "string",
        }
    }
}

/// A contract function description: name, inputs, no outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Function {
    pub name: &'static str,
    pub inputs: &'static [ParamType],
    pub state_mutability: StateMutability,
}

impl Function {
    /// `name(type,type,…)`
    pub fn signature(&self) -> String {
        let inputs: Vec<&str> = self.inputs.iter().map(ParamType::canonical).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature())
    }
}

/// `updateTokenURI(string newURI)`, non-payable, no return value.
pub const UPDATE_TOKEN_URI: Function = Function {
    name: "updateTokenURI",
    inputs: &[ParamType::String],
    state_mutability: StateMutability::NonPayable,
};

/// First four bytes of the Keccak-256 of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Call data for a function taking a single `string`.
pub fn encode_string_call(function: &Function, value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let padded = bytes.len().div_ceil(WORD) * WORD;

    let mut out = Vec::with_capacity(4 + 2 * WORD + padded);
    out.extend_from_slice(&function.selector());
    out.extend_from_slice(&uint_word(WORD as u64)); // head: offset of the tail
    out.extend_from_slice(&uint_word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(4 + 2 * WORD + padded, 0);
    out
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Handle for the target contract: its address plus the one function it
/// exposes to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUriContract {
    pub address: Address,
    pub function: Function,
}

impl TokenUriContract {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            function: UPDATE_TOKEN_URI,
        }
    }

    /// Call data for `updateTokenURI(uri)`.
    pub fn update_token_uri(&self, uri: &str) -> Vec<u8> {
        encode_string_call(&self.function, uri)
    }
}
