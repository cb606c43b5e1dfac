//! Recursive Length Prefix encoding, as used by transaction envelopes.

/// An RLP item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Bytes(Vec<u8>),
    List(Vec<Item>),
}

impl Item {
    /// Unsigned integer, big-endian with leading zeros stripped (0 → empty).
    pub fn uint(value: u128) -> Self {
        let bytes = value.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Item::Bytes(bytes[first..].to_vec())
    }

    /// Big-endian unsigned integer given as bytes; leading zeros stripped.
    pub fn uint_bytes(bytes: &[u8]) -> Self {
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Item::Bytes(bytes[first..].to_vec())
    }

    pub fn bytes(bytes: &[u8]) -> Self {
        Item::Bytes(bytes.to_vec())
    }
}

pub fn encode(item: &Item) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(item, &mut out);
    out
}

fn encode_into(item: &Item, out: &mut Vec<u8>) {
    match item {
        Item::Bytes(bytes) if bytes.len() == 1 && bytes[0] < 0x80 => out.push(bytes[0]),
        Item::Bytes(bytes) => {
            push_header(0x80, bytes.len(), out);
            out.extend_from_slice(bytes);
        }
        Item::List(items) => {
            let mut payload = Vec::new();
            for item in items {
                encode_into(item, &mut payload);
            }
            push_header(0xc0, payload.len(), out);
            out.extend_from_slice(&payload);
        }
    }
}

fn push_header(offset: u8, len: usize, out: &mut Vec<u8>) {
    if len < 56 {
        out.push(offset + len as u8);
    } else {
        let len_bytes = (len as u64).to_be_bytes();
        let first = len_bytes.iter().position(|b| *b != 0).unwrap_or(len_bytes.len());
        let len_bytes = &len_bytes[first..];
        out.push(offset + 55 + len_bytes.len() as u8);
        out.extend_from_slice(len_bytes);
    }
}
