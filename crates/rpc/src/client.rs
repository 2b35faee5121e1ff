//! The RPC client trait.

use crate::error::{Result, RpcError};
use crate::types::{Checkpoint, Commitment, SignatureStatus};
use async_trait::async_trait;
use solflow_core::{Address, Keypair, Signature, Transaction};
use std::time::{Duration, Instant};

/// A handle to a network endpoint.
///
/// Implementations are shared behind an `Arc<dyn Rpc>` for the lifetime of
/// a session.
#[async_trait]
pub trait Rpc: Send + Sync {
    /// Commitment level reads and confirmations are made at.
    fn commitment(&self) -> Commitment {
        Commitment::Confirmed
    }

    /// Delay between confirmation polls.
    fn poll_interval(&self) -> Duration {
        Duration::from_millis(500)
    }

    /// Upper bound on a confirmation wait, on top of blockhash expiry.
    fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(60)
    }

    /// Balance of `address` in lamports.
    async fn get_balance(&self, address: &Address) -> Result<u64>;

    /// Ask the faucet to credit `address`. Returns the airdrop signature.
    async fn request_airdrop(&self, address: &Address, lamports: u64) -> Result<Signature>;

    /// Most recent blockhash and its validity bound.
    async fn get_latest_checkpoint(&self) -> Result<Checkpoint>;

    /// Current block height.
    async fn get_block_height(&self) -> Result<u64>;

    /// Submit a signed transaction. Returns its id without waiting.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature>;

    /// Status of a signature, or `None` if the node has not seen it.
    async fn get_signature_status(&self, signature: &Signature) -> Result<Option<SignatureStatus>>;

    /// Wait until `signature` reaches [`commitment`](Rpc::commitment).
    ///
    /// Fails if the transaction errored, if the block height passes the
    /// checkpoint's last valid height first, or after the confirm timeout.
    async fn confirm_submission(&self, signature: &Signature, checkpoint: &Checkpoint) -> Result<()> {
        let commitment = self.commitment();
        let deadline = Instant::now() + self.confirm_timeout();
        loop {
            if let Some(status) = self.get_signature_status(signature).await? {
                if let Some(reason) = &status.err {
                    return Err(RpcError::TransactionFailed {
                        signature: *signature,
                        reason: reason.clone(),
                    });
                }
                if status.satisfies(commitment) {
                    tracing::debug!(%signature, slot = status.slot, %commitment, "confirmed");
                    return Ok(());
                }
            }

            let block_height = self.get_block_height().await?;
            if block_height > checkpoint.last_valid_block_height {
                return Err(RpcError::Expired {
                    signature: *signature,
                    block_height,
                    last_valid_block_height: checkpoint.last_valid_block_height,
                });
            }
            if Instant::now() >= deadline {
                return Err(RpcError::Timeout(self.confirm_timeout()));
            }
            tokio::time::sleep(self.poll_interval()).await;
        }
    }

    /// Fetch a checkpoint, sign `tx` with `signers`, submit it and wait for
    /// confirmation.
    async fn send_and_confirm(&self, tx: &mut Transaction, signers: &[&Keypair]) -> Result<Signature> {
        let checkpoint = self.get_latest_checkpoint().await?;
        tx.sign(signers, checkpoint.blockhash)?;
        let signature = self.send_transaction(tx).await?;
        self.confirm_submission(&signature, &checkpoint).await?;
        Ok(signature)
    }
}
