//! Ethereum-compatible chain access: encoding, signing, RPC and the
//! token URI committer.

pub mod abi;
pub mod committer;
pub mod primitives;
pub mod rlp;
pub mod rpc;
pub mod signer;
pub mod transaction;

pub use abi::TokenUriContract;
pub use committer::{ChainCommitter, ChainContext, EvmCommitter};
pub use primitives::{Address, TxHash};
pub use rpc::{BlockTag, ChainRpc, JsonRpcClient, TransactionReceipt};
pub use signer::LocalSigner;
pub use transaction::{Eip1559Transaction, Fees, SignedTransaction};
