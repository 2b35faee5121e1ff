//! In-memory test network.
//!
//! `LocalCluster` keeps balances in a map, verifies and applies system
//! transfers synchronously, and produces one block per landed transaction.
//! A built-in faucet keypair funds airdrops with real signed transfers, so
//! airdrop signatures can be confirmed like any other.

use crate::client::Rpc;
use crate::error::{codes, Result, RpcError};
use crate::types::{Checkpoint, Commitment, SignatureStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use solflow_core::{hash_concat, Address, Hash, Keypair, Signature, Transaction, LAMPORTS_PER_SOL};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Configuration for a [`LocalCluster`].
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Fee charged per signature on user transactions.
    pub fee_per_signature: u64,
    /// Largest single airdrop the faucet will grant.
    pub max_airdrop_lamports: u64,
    /// Blocks a blockhash stays usable after it is produced.
    pub blockhash_validity: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            fee_per_signature: 5_000,
            max_airdrop_lamports: 5 * LAMPORTS_PER_SOL,
            blockhash_validity: 150,
        }
    }
}

/// Number of calls made to each RPC method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_balance: usize,
    pub request_airdrop: usize,
    pub get_latest_checkpoint: usize,
    pub send_transaction: usize,
    pub confirm_submission: usize,
}

impl CallCounts {
    /// Total calls across all methods.
    pub fn total(&self) -> usize {
        self.get_balance
            + self.request_airdrop
            + self.get_latest_checkpoint
            + self.send_transaction
            + self.confirm_submission
    }
}

#[derive(Default)]
struct Counters {
    get_balance: AtomicUsize,
    request_airdrop: AtomicUsize,
    get_latest_checkpoint: AtomicUsize,
    send_transaction: AtomicUsize,
    confirm_submission: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

struct State {
    balances: HashMap<Address, u64>,
    slot: u64,
    block_height: u64,
    latest_blockhash: Hash,
    /// Blockhash -> last valid block height.
    blockhashes: HashMap<Hash, u64>,
    statuses: HashMap<Signature, SignatureStatus>,
}

impl State {
    /// Produce a new block and a fresh blockhash.
    fn advance(&mut self, validity: u64) {
        self.slot += 1;
        self.block_height += 1;
        let next = hash_concat(&[
            self.latest_blockhash.as_bytes(),
            &self.block_height.to_le_bytes(),
        ]);
        self.latest_blockhash = next;
        self.blockhashes.insert(next, self.block_height + validity);

        // Nothing referencing an expired blockhash can land again, so its
        // entry and the statuses of transactions that used it are dropped.
        let height = self.block_height;
        self.blockhashes.retain(|_, last_valid| *last_valid >= height);
        self.statuses
            .retain(|_, status| status.slot.saturating_add(validity) >= height);
    }
}

/// An in-memory network with a faucet.
pub struct LocalCluster {
    config: LocalConfig,
    faucet: Keypair,
    state: Mutex<State>,
    counters: Counters,
    faucet_enabled: AtomicBool,
    offline: AtomicBool,
    latency: Mutex<Duration>,
}

impl LocalCluster {
    /// Create a cluster with default configuration.
    pub fn new() -> Self {
        Self::with_config(LocalConfig::default())
    }

    /// Create a cluster with the given configuration.
    pub fn with_config(config: LocalConfig) -> Self {
        let faucet = Keypair::generate();
        let genesis = hash_concat(&[b"solflow-local-genesis", faucet.address().as_bytes()]);
        let mut balances = HashMap::new();
        balances.insert(faucet.address(), u64::MAX / 2);

        let mut blockhashes = HashMap::new();
        blockhashes.insert(genesis, config.blockhash_validity);

        Self {
            config,
            faucet,
            state: Mutex::new(State {
                balances,
                slot: 0,
                block_height: 0,
                latest_blockhash: genesis,
                blockhashes,
                statuses: HashMap::new(),
            }),
            counters: Counters::default(),
            faucet_enabled: AtomicBool::new(true),
            offline: AtomicBool::new(false),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    /// Address of the faucet account.
    pub fn faucet_address(&self) -> Address {
        self.faucet.address()
    }

    /// Current slot.
    pub fn slot(&self) -> u64 {
        self.state.lock().slot
    }

    /// Read a balance without counting it as an RPC call.
    pub fn balance_of(&self, address: &Address) -> u64 {
        self.state.lock().balances.get(address).copied().unwrap_or(0)
    }

    /// Overwrite a balance directly.
    pub fn set_balance(&self, address: &Address, lamports: u64) {
        self.state.lock().balances.insert(*address, lamports);
    }

    /// Produce `n` empty blocks.
    pub fn advance_blocks(&self, n: u64) {
        let mut state = self.state.lock();
        for _ in 0..n {
            state.advance(self.config.blockhash_validity);
        }
    }

    /// Enable or disable the faucet.
    pub fn set_faucet_enabled(&self, enabled: bool) {
        self.faucet_enabled.store(enabled, Ordering::SeqCst);
    }

    /// While offline every RPC call fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay applied to every RPC call before it is served.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Calls made so far, per method.
    pub fn calls(&self) -> CallCounts {
        let load = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        CallCounts {
            get_balance: load(&self.counters.get_balance),
            request_airdrop: load(&self.counters.request_airdrop),
            get_latest_checkpoint: load(&self.counters.get_latest_checkpoint),
            send_transaction: load(&self.counters.send_transaction),
            confirm_submission: load(&self.counters.confirm_submission),
        }
    }

    async fn enter(&self) -> Result<()> {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(RpcError::rpc(codes::NODE_UNHEALTHY, "Node is unhealthy"));
        }
        Ok(())
    }

    /// Verify and apply a transaction, producing a block.
    fn process(&self, tx: &Transaction, charge_fee: bool) -> Result<Signature> {
        let preflight = |msg: String| RpcError::rpc(codes::SEND_TRANSACTION_PREFLIGHT_FAILURE, msg);

        tx.verify().map_err(|e| {
            RpcError::rpc(
                codes::SIGNATURE_VERIFICATION_FAILURE,
                format!("Transaction signature verification failure: {e}"),
            )
        })?;
        let signature = tx.id().ok_or(RpcError::Transaction(
            solflow_core::TransactionError::MissingSignature,
        ))?;
        let (from, to, lamports) = tx
            .as_system_transfer()
            .ok_or_else(|| preflight("only system transfers are supported".into()))?;
        let payer = *tx
            .message
            .payer()
            .ok_or_else(|| preflight("transaction has no fee payer".into()))?;
        let keys = &tx.message.account_keys;
        let signed_writable = |address: &Address| {
            keys.iter().position(|k| k == address).is_some_and(|i| {
                i < tx.message.header.num_required_signatures as usize && tx.message.is_writable(i)
            })
        };
        if !signed_writable(&from) {
            return Err(preflight(format!("transfer source {from} did not sign")));
        }
        if !keys
            .iter()
            .position(|k| *k == to)
            .is_some_and(|i| tx.message.is_writable(i))
        {
            return Err(preflight(format!("transfer destination {to} is not writable")));
        }

        let mut state = self.state.lock();
        match state.blockhashes.get(&tx.message.recent_blockhash) {
            Some(&last_valid) if last_valid >= state.block_height => {}
            _ => return Err(preflight("Blockhash not found".into())),
        }
        if state.statuses.contains_key(&signature) {
            return Err(preflight(
                "This transaction has already been processed".into(),
            ));
        }

        let fee = if charge_fee {
            self.config
                .fee_per_signature
                .saturating_mul(tx.signatures.len() as u64)
        } else {
            0
        };
        let balance = |state: &State, address: &Address| state.balances.get(address).copied().unwrap_or(0);
        let payer_balance = balance(&state, &payer);
        if payer_balance < fee {
            return Err(preflight(format!(
                "insufficient funds for fee: required {fee}, available {payer_balance}"
            )));
        }
        let source_available = if from == payer {
            payer_balance - fee
        } else {
            balance(&state, &from)
        };
        if source_available < lamports {
            return Err(preflight(format!(
                "insufficient funds: required {lamports}, available {source_available}"
            )));
        }

        state.balances.insert(payer, payer_balance - fee);
        let source_balance = balance(&state, &from);
        state.balances.insert(from, source_balance - lamports);
        let credited = state.balances.entry(to).or_insert(0);
        *credited = credited.saturating_add(lamports);

        state.advance(self.config.blockhash_validity);
        let slot = state.slot;
        state.statuses.insert(
            signature,
            SignatureStatus {
                slot,
                confirmations: None,
                err: None,
                confirmation_status: Some(Commitment::Confirmed),
            },
        );
        tracing::debug!(%signature, %from, %to, lamports, fee, slot, "transaction landed");
        Ok(signature)
    }
}

impl Default for LocalCluster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Rpc for LocalCluster {
    async fn get_balance(&self, address: &Address) -> Result<u64> {
        bump(&self.counters.get_balance);
        self.enter().await?;
        Ok(self.balance_of(address))
    }

    async fn request_airdrop(&self, address: &Address, lamports: u64) -> Result<Signature> {
        bump(&self.counters.request_airdrop);
        self.enter().await?;
        if !self.faucet_enabled.load(Ordering::SeqCst) {
            return Err(RpcError::rpc(codes::INTERNAL_ERROR, "airdrop request failed"));
        }
        if lamports == 0 || lamports > self.config.max_airdrop_lamports {
            return Err(RpcError::rpc(
                codes::INVALID_PARAMS,
                format!(
                    "airdrop amount must be between 1 and {} lamports",
                    self.config.max_airdrop_lamports
                ),
            ));
        }

        let blockhash = self.state.lock().latest_blockhash;
        let mut tx = Transaction::transfer(&self.faucet.address(), address, lamports);
        tx.sign(&[&self.faucet], blockhash)?;
        let signature = self.process(&tx, false)?;
        tracing::info!(%address, lamports, %signature, "airdrop granted");
        Ok(signature)
    }

    async fn get_latest_checkpoint(&self) -> Result<Checkpoint> {
        bump(&self.counters.get_latest_checkpoint);
        self.enter().await?;
        let state = self.state.lock();
        let last_valid_block_height = state
            .blockhashes
            .get(&state.latest_blockhash)
            .copied()
            .unwrap_or(state.block_height);
        Ok(Checkpoint {
            blockhash: state.latest_blockhash,
            last_valid_block_height,
        })
    }

    async fn get_block_height(&self) -> Result<u64> {
        self.enter().await?;
        Ok(self.state.lock().block_height)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        bump(&self.counters.send_transaction);
        self.enter().await?;
        self.process(tx, true)
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<Option<SignatureStatus>> {
        self.enter().await?;
        Ok(self.state.lock().statuses.get(signature).cloned())
    }

    /// Transactions land synchronously, so an unknown signature will never
    /// confirm.
    async fn confirm_submission(&self, signature: &Signature, checkpoint: &Checkpoint) -> Result<()> {
        bump(&self.counters.confirm_submission);
        self.enter().await?;
        let state = self.state.lock();
        match state.statuses.get(signature) {
            Some(SignatureStatus { err: Some(reason), .. }) => Err(RpcError::TransactionFailed {
                signature: *signature,
                reason: reason.clone(),
            }),
            Some(_) => Ok(()),
            None if state.block_height > checkpoint.last_valid_block_height => {
                Err(RpcError::Expired {
                    signature: *signature,
                    block_height: state.block_height,
                    last_valid_block_height: checkpoint.last_valid_block_height,
                })
            }
            None => Err(RpcError::rpc(
                codes::SIGNATURE_NOT_FOUND,
                format!("signature {signature} not found"),
            )),
        }
    }
}
