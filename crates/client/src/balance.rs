//! Balance viewing and faucet funding.

use crate::error::ActionError;
use solflow_core::{format_sol, Address, Signature};
use solflow_rpc::Rpc;
use std::fmt;

/// The last balance shown for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub address: Address,
    pub lamports: u64,
}

impl BalanceSnapshot {
    /// Balance in SOL, three decimals.
    pub fn display(&self) -> String {
        format_sol(self.lamports)
    }
}

impl fmt::Display for BalanceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SOL", self.display())
    }
}

/// Whether a refresh may request faucet funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingPolicy {
    Never,
    /// Request one airdrop of `lamports` if the balance is exactly zero.
    WhenEmpty { lamports: u64 },
}

/// Fetch the current balance.
pub async fn fetch_balance(rpc: &dyn Rpc, address: &Address) -> Result<BalanceSnapshot, ActionError> {
    let lamports = rpc.get_balance(address).await?;
    tracing::debug!(%address, lamports, "balance fetched");
    Ok(BalanceSnapshot {
        address: *address,
        lamports,
    })
}

/// Request one faucet credit and wait for it to confirm.
pub async fn fund(rpc: &dyn Rpc, address: &Address, lamports: u64) -> Result<Signature, ActionError> {
    let signature = rpc.request_airdrop(address, lamports).await?;
    let checkpoint = rpc.get_latest_checkpoint().await?;
    rpc.confirm_submission(&signature, &checkpoint).await?;
    tracing::info!(%address, lamports, %signature, "airdrop confirmed");
    Ok(signature)
}

/// Fetch the balance, funding the account once first if it is empty and
/// the policy allows it.
pub async fn refresh_balance(
    rpc: &dyn Rpc,
    address: &Address,
    policy: FundingPolicy,
) -> Result<BalanceSnapshot, ActionError> {
    let snapshot = fetch_balance(rpc, address).await?;
    match policy {
        FundingPolicy::WhenEmpty { lamports } if snapshot.lamports == 0 => {
            fund(rpc, address, lamports).await?;
            fetch_balance(rpc, address).await
        }
        _ => Ok(snapshot),
    }
}
