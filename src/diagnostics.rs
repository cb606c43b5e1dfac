//! Read-only preflight: can we reach the node, who signs, and is the
//! contract there.
//!
//! Balances are formatted with `rust_decimal` for exact fixed-point output.

use std::fmt;

use rust_decimal::Decimal;

use crate::chain::{Address, ChainContext};
use crate::error::PipelineResult;

/// Wei per ether, as a decimal scale.
const ETHER_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub chain_id: u64,
    pub block_number: u64,
    pub account: Address,
    pub balance_wei: u128,
    pub contract: Address,
    pub contract_deployed: bool,
}

impl DiagnosticReport {
    /// Balance in ether, trailing zeros removed. `None` if the balance is
    /// beyond `Decimal`'s 96-bit mantissa.
    pub fn balance_ether(&self) -> Option<Decimal> {
        let wei = i128::try_from(self.balance_wei).ok()?;
        Decimal::try_from_i128_with_scale(wei, ETHER_DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "chain id:  {}", self.chain_id)?;
        writeln!(f, "block:     {}", self.block_number)?;
        writeln!(f, "account:   {}", self.account)?;
        match self.balance_ether() {
            Some(ether) => writeln!(f, "balance:   {} ETH", ether)?,
            None => writeln!(f, "balance:   {} wei", self.balance_wei)?,
        }
        write!(
            f,
            "contract:  {} ({})",
            self.contract,
            if self.contract_deployed {
                "deployed"
            } else {
                "no code"
            }
        )
    }
}

/// Query the node. Sends nothing and signs nothing.
pub async fn check(ctx: &ChainContext) -> PipelineResult<DiagnosticReport> {
    let rpc = ctx.rpc();
    let account = ctx.signer().address();
    let contract = ctx.contract().address;

    let chain_id = rpc.chain_id().await?;
    let block_number = rpc.block_number().await?;
    let balance_wei = rpc.balance(account).await?;
    let code = rpc.code(contract).await?;

    let report = DiagnosticReport {
        chain_id,
        block_number,
        account,
        balance_wei,
        contract,
        contract_deployed: !code.is_empty(),
    };
    tracing::info!(
        chain_id,
        block_number,
        account = %account,
        deployed = report.contract_deployed,
        "diagnostics complete"
    );
    Ok(report)
}
