//! Commits a metadata locator on-chain via `updateTokenURI`.
//!
//! Lifecycle of one commit:
//!
//! 1. read a fresh nonce (never cached), chain id and gas price
//! 2. build the unsigned type-2 transaction
//! 3. sign locally
//! 4. broadcast; the returned hash identifies the pending transaction
//! 5. poll until a receipt appears or the nonce is consumed without one
//!
//! The broadcast is never retried. There is no overall timeout; callers
//! own that policy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::domain::pinning::Locator;
use crate::error::{PipelineError, PipelineResult};
use crate::http::{Delay, HttpClient, TimerDelay};

use super::abi::TokenUriContract;
use super::primitives::{Address, TxHash};
use super::rpc::{BlockTag, ChainRpc, JsonRpcClient, TransactionReceipt};
use super::signer::LocalSigner;
use super::transaction::{Eip1559Transaction, Fees, SignedTransaction, GAS_LIMIT};

/// Consecutive polls that must find the nonce consumed and the receipt
/// still missing before the transaction is reported dropped.
pub const DROPPED_AFTER_POLLS: u32 = 5;

/// Writes the metadata locator to the contract.
#[async_trait]
pub trait ChainCommitter: Send + Sync {
    async fn commit(&self, locator: &Locator) -> PipelineResult<TxHash>;
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// Handles owned for the life of a run: node access, the signing account
/// and the resolved contract.
pub struct ChainContext {
    rpc: Arc<dyn ChainRpc>,
    signer: LocalSigner,
    contract: TokenUriContract,
}

impl ChainContext {
    pub fn new(rpc: Arc<dyn ChainRpc>, signer: LocalSigner, contract: TokenUriContract) -> Self {
        Self {
            rpc,
            signer,
            contract,
        }
    }

    /// Parse the key and contract address and set up the JSON-RPC client.
    /// Performs no network I/O.
    pub fn from_config(config: &Config, http: HttpClient) -> PipelineResult<Self> {
        let signer = LocalSigner::from_secret(&config.private_key)?;
        let address: Address = config.contract_address.parse().map_err(|e| match e {
            PipelineError::Configuration(msg) => {
                PipelineError::config(format!("CONTRACT_ADDRESS is invalid: {}", msg))
            }
            other => other,
        })?;
        let rpc = JsonRpcClient::new(http, config.rpc_url.clone());
        Ok(Self::new(
            Arc::new(rpc),
            signer,
            TokenUriContract::new(address),
        ))
    }

    pub fn rpc(&self) -> &dyn ChainRpc {
        self.rpc.as_ref()
    }

    pub fn signer(&self) -> &LocalSigner {
        &self.signer
    }

    pub fn contract(&self) -> &TokenUriContract {
        &self.contract
    }
}

impl std::fmt::Debug for ChainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainContext")
            .field("signer", &self.signer)
            .field("contract", &self.contract.address.to_checksum())
            .finish_non_exhaustive()
    }
}

// ─── Committer ───────────────────────────────────────────────────────────────

pub struct EvmCommitter {
    ctx: ChainContext,
    poll_interval: Duration,
    delay: Arc<dyn Delay>,
}

impl EvmCommitter {
    pub fn new(ctx: ChainContext, poll_interval: Duration) -> Self {
        Self {
            ctx,
            poll_interval,
            delay: Arc::new(TimerDelay),
        }
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn context(&self) -> &ChainContext {
        &self.ctx
    }

    /// Steps 1 and 2: fresh chain reads, then the unsigned transaction.
    pub async fn build_transaction(&self, locator: &Locator) -> PipelineResult<Eip1559Transaction> {
        let rpc = self.ctx.rpc();
        let from = self.ctx.signer.address();

        let nonce = rpc.transaction_count(from, BlockTag::Pending).await?;
        let chain_id = rpc.chain_id().await?;
        let gas_price = rpc.gas_price().await?;
        let fees = Fees::from_gas_price(gas_price);

        tracing::debug!(
            nonce,
            chain_id,
            gas_price,
            max_fee_per_gas = fees.max_fee_per_gas,
            "transaction built"
        );

        Ok(Eip1559Transaction {
            chain_id,
            nonce,
            fees,
            gas_limit: GAS_LIMIT,
            to: self.ctx.contract.address,
            value: 0,
            data: self.ctx.contract.update_token_uri(locator.as_str()),
        })
    }

    /// Step 5: poll until a receipt appears.
    ///
    /// A transaction whose nonce stays consumed without a receipt for
    /// [`DROPPED_AFTER_POLLS`] consecutive polls was replaced or dropped.
    /// Nonce and receipt reads may come from different node backends.
    async fn wait_for_receipt(
        &self,
        signed: &SignedTransaction,
        hash: TxHash,
    ) -> PipelineResult<TransactionReceipt> {
        let rpc = self.ctx.rpc();
        let from = self.ctx.signer.address();
        let mut polls: u64 = 0;
        let mut consumed_without_receipt: u32 = 0;

        loop {
            if let Some(receipt) = rpc.transaction_receipt(hash).await? {
                return Ok(receipt);
            }

            let mined_nonce = rpc.transaction_count(from, BlockTag::Latest).await?;
            if mined_nonce > signed.nonce {
                consumed_without_receipt += 1;
                if consumed_without_receipt >= DROPPED_AFTER_POLLS {
                    return Err(PipelineError::ChainRejection {
                        tx_hash: hash.to_hex(),
                        reason: format!(
                            "dropped: nonce {} was consumed by another transaction",
                            signed.nonce
                        ),
                    });
                }
            } else {
                consumed_without_receipt = 0;
            }

            polls += 1;
            tracing::debug!(%hash, polls, consumed_without_receipt, "waiting for confirmation");
            self.delay.sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ChainCommitter for EvmCommitter {
    async fn commit(&self, locator: &Locator) -> PipelineResult<TxHash> {
        let unsigned = self.build_transaction(locator).await?;
        let signed = unsigned.sign(&self.ctx.signer)?;

        let hash = self.ctx.rpc().send_raw_transaction(&signed.raw).await?;
        if hash != signed.hash {
            tracing::warn!(node = %hash, local = %signed.hash, "node reported a different transaction hash");
        }
        tracing::info!(%hash, nonce = signed.nonce, "transaction broadcast");

        let receipt = self.wait_for_receipt(&signed, hash).await?;
        if receipt.reverted() {
            return Err(PipelineError::ChainRejection {
                tx_hash: hash.to_hex(),
                reason: match receipt.block_number {
                    Some(block) => format!("reverted in block {}", block),
                    None => "reverted".to_string(),
                },
            });
        }

        tracing::info!(
            %hash,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "transaction confirmed"
        );
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::primitives::keccak256;
    use crate::config::Secret;
    use std::sync::Mutex;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const CONTRACT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    /// In-memory node. Broadcasts bump the pending nonce; receipts appear
    /// after `polls_until_mined` receipt lookups.
    struct FakeRpc {
        state: Mutex<FakeState>,
        polls_until_mined: u32,
        receipt_status: u64,
        /// Simulate another transaction taking our nonce.
        replaced: bool,
        /// The `latest` nonce moves on broadcast, ahead of the receipt.
        nonce_leads_receipt: bool,
    }

    #[derive(Default)]
    struct FakeState {
        pending_nonce: u64,
        mined_nonce: u64,
        sent: Vec<Vec<u8>>,
        pending_reads: u32,
        receipt_lookups: u32,
    }

    impl FakeRpc {
        fn new(start_nonce: u64) -> Self {
            Self {
                state: Mutex::new(FakeState {
                    pending_nonce: start_nonce,
                    mined_nonce: start_nonce,
                    ..Default::default()
                }),
                polls_until_mined: 0,
                receipt_status: 1,
                replaced: false,
                nonce_leads_receipt: false,
            }
        }
    }

    #[async_trait]
    impl ChainRpc for FakeRpc {
        async fn chain_id(&self) -> PipelineResult<u64> {
            Ok(1)
        }
        async fn block_number(&self) -> PipelineResult<u64> {
            Ok(100)
        }
        async fn gas_price(&self) -> PipelineResult<u128> {
            Ok(1_000_000_000)
        }
        async fn transaction_count(&self, _: Address, tag: BlockTag) -> PipelineResult<u64> {
            let mut state = self.state.lock().unwrap();
            match tag {
                BlockTag::Pending => {
                    state.pending_reads += 1;
                    Ok(state.pending_nonce)
                }
                BlockTag::Latest => Ok(state.mined_nonce),
            }
        }
        async fn balance(&self, _: Address) -> PipelineResult<u128> {
            Ok(0)
        }
        async fn code(&self, _: Address) -> PipelineResult<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn send_raw_transaction(&self, raw: &[u8]) -> PipelineResult<TxHash> {
            let mut state = self.state.lock().unwrap();
            state.pending_nonce += 1;
            if self.replaced || self.nonce_leads_receipt {
                state.mined_nonce += 1;
            }
            state.sent.push(raw.to_vec());
            Ok(TxHash::from_bytes(keccak256(raw)))
        }
        async fn transaction_receipt(
            &self,
            hash: TxHash,
        ) -> PipelineResult<Option<TransactionReceipt>> {
            let mut state = self.state.lock().unwrap();
            state.receipt_lookups += 1;
            if self.replaced || state.receipt_lookups <= self.polls_until_mined {
                return Ok(None);
            }
            state.mined_nonce = state.pending_nonce;
            Ok(Some(TransactionReceipt {
                transaction_hash: hash,
                block_number: Some(101),
                status: Some(self.receipt_status),
                gas_used: Some(30_000),
            }))
        }
    }

    #[derive(Default)]
    struct CountingDelay(Mutex<Vec<Duration>>);

    #[async_trait]
    impl Delay for CountingDelay {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn committer(rpc: Arc<FakeRpc>, delay: Arc<CountingDelay>) -> EvmCommitter {
        let signer = LocalSigner::from_secret(&Secret::from(KEY)).unwrap();
        let contract = TokenUriContract::new(CONTRACT.parse().unwrap());
        EvmCommitter::new(ChainContext::new(rpc, signer, contract), Duration::from_secs(2))
            .with_delay(delay)
    }

    fn locator() -> Locator {
        Locator::from_hash("Qm456Meta").unwrap()
    }

    #[tokio::test]
    async fn test_build_transaction() {
        let rpc = Arc::new(FakeRpc::new(9));
        let c = committer(rpc, Arc::new(CountingDelay::default()));
        let tx = c.build_transaction(&locator()).await.unwrap();
        assert_eq!(tx.nonce, 9);
        assert_eq!(tx.chain_id, 1);
        assert_eq!(tx.gas_limit, 200_000);
        assert_eq!(tx.fees.max_priority_fee_per_gas, 1_000_000_000);
        assert_eq!(tx.fees.max_fee_per_gas, 2_000_000_000);
        assert_eq!(tx.value, 0);
        assert_eq!(tx.to.to_string(), CONTRACT);
        assert_eq!(
            tx.data,
            TokenUriContract::new(CONTRACT.parse().unwrap()).update_token_uri("ipfs://Qm456Meta")
        );
    }

    #[tokio::test]
    async fn test_commit_returns_hash_after_confirmation() {
        let rpc = Arc::new(FakeRpc {
            polls_until_mined: 2,
            ..FakeRpc::new(0)
        });
        let delay = Arc::new(CountingDelay::default());
        let c = committer(rpc.clone(), delay.clone());

        let hash = c.commit(&locator()).await.unwrap();

        let state = rpc.state.lock().unwrap();
        assert_eq!(state.sent.len(), 1);
        assert_eq!(hash.as_bytes(), &keccak256(&state.sent[0]));
        assert_eq!(delay.0.lock().unwrap().as_slice(), &[Duration::from_secs(2); 2]);
    }

    #[tokio::test]
    async fn test_fresh_nonce_per_commit() {
        let rpc = Arc::new(FakeRpc::new(5));
        let c = committer(rpc.clone(), Arc::new(CountingDelay::default()));

        c.commit(&locator()).await.unwrap();
        c.commit(&locator()).await.unwrap();

        let state = rpc.state.lock().unwrap();
        assert_eq!(state.pending_reads, 2);
        assert_eq!(state.sent.len(), 2);
        // 0x02, list header (0xf8, len), chain id 0x01, then the nonce byte.
        assert_eq!(state.sent[0][4], 5);
        assert_eq!(state.sent[1][4], 6);
    }

    #[tokio::test]
    async fn test_reverted_receipt_is_chain_rejection() {
        let rpc = Arc::new(FakeRpc {
            receipt_status: 0,
            ..FakeRpc::new(0)
        });
        let c = committer(rpc, Arc::new(CountingDelay::default()));
        let err = c.commit(&locator()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ChainRejection { ref reason, .. } if reason == "reverted in block 101"
        ));
    }

    #[tokio::test]
    async fn test_replaced_transaction_is_chain_rejection() {
        let rpc = Arc::new(FakeRpc {
            replaced: true,
            ..FakeRpc::new(3)
        });
        let delay = Arc::new(CountingDelay::default());
        let c = committer(rpc.clone(), delay.clone());
        let err = c.commit(&locator()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ChainRejection { ref reason, .. } if reason.contains("nonce 3")
        ));
        assert_eq!(
            rpc.state.lock().unwrap().receipt_lookups,
            DROPPED_AFTER_POLLS
        );
        assert_eq!(delay.0.lock().unwrap().len() as u32, DROPPED_AFTER_POLLS - 1);
    }

    #[tokio::test]
    async fn test_receipt_lagging_nonce_is_still_confirmed() {
        let rpc = Arc::new(FakeRpc {
            nonce_leads_receipt: true,
            polls_until_mined: 2,
            ..FakeRpc::new(0)
        });
        let delay = Arc::new(CountingDelay::default());
        let c = committer(rpc.clone(), delay.clone());

        let hash = c.commit(&locator()).await.unwrap();

        let state = rpc.state.lock().unwrap();
        assert_eq!(hash.as_bytes(), &keccak256(&state.sent[0]));
        assert_eq!(state.receipt_lookups, 3);
        assert_eq!(delay.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_context_debug_hides_key() {
        let signer = LocalSigner::from_secret(&Secret::from(KEY)).unwrap();
        let ctx = ChainContext::new(
            Arc::new(FakeRpc::new(0)),
            signer,
            TokenUriContract::new(CONTRACT.parse().unwrap()),
        );
        assert!(!format!("{:?}", ctx).contains(&KEY[2..]));
    }

    #[test]
    fn test_context_from_config_rejects_bad_address() {
        let config = Config::from_lookup(|key| match key {
            "RPC_URL" => Some("http://127.0.0.1:8545".into()),
            "PRIVATE_KEY" => Some(KEY.into()),
            "CONTRACT_ADDRESS" => Some("0xnope".into()),
            _ => None,
        })
        .unwrap();
        let err = ChainContext::from_config(&config, HttpClient::new().unwrap()).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
