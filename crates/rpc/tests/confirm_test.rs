//! The provided `confirm_submission` polling loop against a scripted node.

use async_trait::async_trait;
use parking_lot::Mutex;
use solflow_core::{Address, Hash, Signature, Transaction};
use solflow_rpc::{codes, Checkpoint, Commitment, Result, Rpc, RpcError, SignatureStatus};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Answers status polls from a script and grows the block height by
/// `height_step` per poll.
struct ScriptedNode {
    statuses: Mutex<VecDeque<Option<SignatureStatus>>>,
    block_height: AtomicU64,
    height_step: u64,
    timeout: Duration,
    polls: AtomicU64,
}

impl ScriptedNode {
    fn new(statuses: Vec<Option<SignatureStatus>>, height_step: u64) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            block_height: AtomicU64::new(0),
            height_step,
            timeout: Duration::from_secs(5),
            polls: AtomicU64::new(0),
        }
    }

    fn unsupported<T>() -> Result<T> {
        Err(RpcError::rpc(codes::METHOD_NOT_FOUND, "not scripted"))
    }
}

#[async_trait]
impl Rpc for ScriptedNode {
    fn poll_interval(&self) -> Duration {
        Duration::from_millis(1)
    }

    fn confirm_timeout(&self) -> Duration {
        self.timeout
    }

    async fn get_balance(&self, _: &Address) -> Result<u64> {
        Self::unsupported()
    }

    async fn request_airdrop(&self, _: &Address, _: u64) -> Result<Signature> {
        Self::unsupported()
    }

    async fn get_latest_checkpoint(&self) -> Result<Checkpoint> {
        Self::unsupported()
    }

    async fn get_block_height(&self) -> Result<u64> {
        Ok(self.block_height.fetch_add(self.height_step, Ordering::SeqCst) + self.height_step)
    }

    async fn send_transaction(&self, _: &Transaction) -> Result<Signature> {
        Self::unsupported()
    }

    async fn get_signature_status(&self, _: &Signature) -> Result<Option<SignatureStatus>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.statuses.lock().pop_front().flatten())
    }
}

fn status(level: Commitment, err: Option<&str>) -> Option<SignatureStatus> {
    Some(SignatureStatus {
        slot: 1,
        confirmations: Some(0),
        err: err.map(str::to_string),
        confirmation_status: Some(level),
    })
}

fn checkpoint(last_valid_block_height: u64) -> Checkpoint {
    Checkpoint {
        blockhash: Hash::ZERO,
        last_valid_block_height,
    }
}

#[tokio::test]
async fn test_waits_for_commitment() {
    let node = ScriptedNode::new(
        vec![None, status(Commitment::Processed, None), status(Commitment::Confirmed, None)],
        0,
    );
    node.confirm_submission(&Signature::default(), &checkpoint(100))
        .await
        .unwrap();
    assert_eq!(node.polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failed_transaction_reported() {
    let node = ScriptedNode::new(
        vec![status(Commitment::Confirmed, Some("InsufficientFundsForFee"))],
        0,
    );
    let err = node
        .confirm_submission(&Signature::default(), &checkpoint(100))
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::TransactionFailed { reason, .. } if reason == "InsufficientFundsForFee"));
}

#[tokio::test]
async fn test_expires_past_last_valid_height() {
    let node = ScriptedNode::new(Vec::new(), 10);
    let err = node
        .confirm_submission(&Signature::default(), &checkpoint(25))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RpcError::Expired {
            block_height: 30,
            last_valid_block_height: 25,
            ..
        }
    ));
}

#[tokio::test]
async fn test_times_out() {
    let mut node = ScriptedNode::new(Vec::new(), 0);
    node.timeout = Duration::from_millis(20);
    let err = node
        .confirm_submission(&Signature::default(), &checkpoint(100))
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Timeout(_)));
}
