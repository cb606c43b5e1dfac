//! Node access: the `ChainRpc` seam and its JSON-RPC implementation.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Secret;
use crate::error::{PipelineResult, TransportError};
use crate::http::HttpClient;

use super::primitives::{hex_data, parse_quantity, Address, TxHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
}

impl BlockTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockTag::Latest => "latest",
            BlockTag::Pending => "pending",
        }
    }
}

/// Mined transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// 1 = success, 0 = reverted. Absent on pre-Byzantium chains.
    pub status: Option<u64>,
    pub gas_used: Option<u64>,
}

impl TransactionReceipt {
    pub fn reverted(&self) -> bool {
        self.status == Some(0)
    }
}

/// The node operations the committer and diagnostics rely on.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn chain_id(&self) -> PipelineResult<u64>;

    async fn block_number(&self) -> PipelineResult<u64>;

    async fn gas_price(&self) -> PipelineResult<u128>;

    /// Account nonce at `tag`.
    async fn transaction_count(&self, address: Address, tag: BlockTag) -> PipelineResult<u64>;

    async fn balance(&self, address: Address) -> PipelineResult<u128>;

    async fn code(&self, address: Address) -> PipelineResult<Vec<u8>>;

    async fn send_raw_transaction(&self, raw: &[u8]) -> PipelineResult<TxHash>;

    /// `None` while the transaction is not yet mined.
    async fn transaction_receipt(&self, hash: TxHash)
        -> PipelineResult<Option<TransactionReceipt>>;
}

// ─── JSON-RPC wire ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptWire {
    transaction_hash: String,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    gas_used: Option<String>,
}

impl ReceiptWire {
    fn into_receipt(self) -> Result<TransactionReceipt, TransportError> {
        let quantity = |v: Option<String>| v.map(quantity_u64).transpose();
        Ok(TransactionReceipt {
            transaction_hash: self.transaction_hash.parse()?,
            block_number: quantity(self.block_number)?,
            status: quantity(self.status)?,
            gas_used: quantity(self.gas_used)?,
        })
    }
}

fn quantity_u64(value: String) -> Result<u64, TransportError> {
    let n = parse_quantity(&value)?;
    u64::try_from(n).map_err(|_| TransportError::Decode(format!("quantity out of range: {}", value)))
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// JSON-RPC 2.0 over HTTP. The endpoint URL is treated as a secret.
pub struct JsonRpcClient {
    http: HttpClient,
    url: Secret,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(http: HttpClient, url: Secret) -> Self {
        Self {
            http,
            url,
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, id, "rpc call");

        let request = self.http.post(self.url.expose()).json(&body);
        let response: RpcResponse = self.http.send_json(request).await?;

        if let Some(err) = response.error {
            return Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(serde_json::from_value(response.result.unwrap_or(Value::Null))?)
    }
}

#[async_trait]
impl ChainRpc for JsonRpcClient {
    async fn chain_id(&self) -> PipelineResult<u64> {
        let raw: String = self.call("eth_chainId", json!([])).await?;
        Ok(quantity_u64(raw)?)
    }

    async fn block_number(&self) -> PipelineResult<u64> {
        let raw: String = self.call("eth_blockNumber", json!([])).await?;
        Ok(quantity_u64(raw)?)
    }

    async fn gas_price(&self) -> PipelineResult<u128> {
        let raw: String = self.call("eth_gasPrice", json!([])).await?;
        Ok(parse_quantity(&raw)?)
    }

    async fn transaction_count(&self, address: Address, tag: BlockTag) -> PipelineResult<u64> {
        let raw: String = self
            .call(
                "eth_getTransactionCount",
                json!([address.to_checksum(), tag.as_str()]),
            )
            .await?;
        Ok(quantity_u64(raw)?)
    }

    async fn balance(&self, address: Address) -> PipelineResult<u128> {
        let raw: String = self
            .call("eth_getBalance", json!([address.to_checksum(), "latest"]))
            .await?;
        Ok(parse_quantity(&raw)?)
    }

    async fn code(&self, address: Address) -> PipelineResult<Vec<u8>> {
        let raw: String = self
            .call("eth_getCode", json!([address.to_checksum(), "latest"]))
            .await?;
        let digits = raw.strip_prefix("0x").unwrap_or(&raw);
        Ok(hex::decode(digits).map_err(|_| TransportError::Decode("invalid code hex".into()))?)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> PipelineResult<TxHash> {
        let hash: String = self
            .call("eth_sendRawTransaction", json!([hex_data(raw)]))
            .await?;
        Ok(hash.parse::<TxHash>()?)
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> PipelineResult<Option<TransactionReceipt>> {
        let wire: Option<ReceiptWire> = self
            .call("eth_getTransactionReceipt", json!([hash.to_hex()]))
            .await?;
        Ok(wire.map(ReceiptWire::into_receipt).transpose()?)
    }
}
