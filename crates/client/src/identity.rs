//! Identities and the wallet adapter boundary.

use async_trait::async_trait;
use parking_lot::RwLock;
use solflow_core::{Address, Hash, Keypair, Signature, Transaction, TransactionError};
use solflow_rpc::{Rpc, RpcError};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a wallet adapter.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet not connected")]
    NotConnected,

    #[error("wallet rejected the request: {0}")]
    Rejected(String),

    #[error("failed to load wallet keypair: {0}")]
    Load(String),

    #[error("failed to sign: {0}")]
    Signing(#[from] TransactionError),

    #[error("wallet RPC error: {0}")]
    Rpc(#[from] RpcError),
}

/// An external wallet: exposes a public key and signs and sends
/// transactions on the holder's behalf. Private keys never cross this
/// boundary.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Human-readable wallet name.
    fn name(&self) -> &str;

    /// Connect and return the wallet's public key.
    async fn connect(&self) -> Result<Address, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Public key, while connected.
    fn public_key(&self) -> Option<Address>;

    fn connected(&self) -> bool {
        self.public_key().is_some()
    }

    /// Sign `tx` as fee payer and submit it through `rpc`.
    ///
    /// If the transaction has no recent blockhash yet, the wallet fetches
    /// one itself.
    async fn send_transaction(&self, tx: Transaction, rpc: &dyn Rpc) -> Result<Signature, WalletError>;
}

/// Who actions are performed as.
#[derive(Clone)]
pub enum Identity {
    /// A keypair generated in this process and held only in memory.
    Local(Arc<Keypair>),
    /// A connected wallet; only its public key is known here.
    Wallet {
        address: Address,
        adapter: Arc<dyn WalletAdapter>,
    },
}

impl Identity {
    pub fn local(keypair: Keypair) -> Self {
        Identity::Local(Arc::new(keypair))
    }

    pub fn address(&self) -> Address {
        match self {
            Identity::Local(keypair) => keypair.address(),
            Identity::Wallet { address, .. } => *address,
        }
    }

    /// The keypair, for local identities.
    pub fn keypair(&self) -> Option<&Keypair> {
        match self {
            Identity::Local(keypair) => Some(keypair.as_ref()),
            Identity::Wallet { .. } => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Identity::Local(_))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Local(keypair) => f.debug_tuple("Local").field(&keypair.address()).finish(),
            Identity::Wallet { address, adapter } => f
                .debug_struct("Wallet")
                .field("name", &adapter.name())
                .field("address", address)
                .finish(),
        }
    }
}

/// Where a [`KeypairWallet`] gets its key.
#[derive(Clone)]
enum KeySource {
    /// A Solana CLI keypair file: a JSON array of 64 bytes.
    File(PathBuf),
    Memory(Arc<Keypair>),
}

/// A wallet adapter that signs in-process with a keypair it owns.
///
/// Stands in for a browser extension wallet: callers only ever see its
/// public key and its `send_transaction` capability.
pub struct KeypairWallet {
    name: String,
    source: KeySource,
    active: RwLock<Option<Arc<Keypair>>>,
}

impl KeypairWallet {
    /// A wallet backed by a keypair file, read on `connect`.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("file:{}", path.display()),
            source: KeySource::File(path),
            active: RwLock::new(None),
        }
    }

    /// A wallet backed by an in-memory keypair.
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            name: "memory".to_string(),
            source: KeySource::Memory(Arc::new(keypair)),
            active: RwLock::new(None),
        }
    }

    fn load(&self) -> Result<Arc<Keypair>, WalletError> {
        match &self.source {
            KeySource::Memory(keypair) => Ok(keypair.clone()),
            KeySource::File(path) => {
                let contents = fs::read_to_string(path)
                    .map_err(|e| WalletError::Load(format!("{}: {e}", path.display())))?;
                let bytes: Vec<u8> = serde_json::from_str(&contents)
                    .map_err(|e| WalletError::Load(format!("{}: {e}", path.display())))?;
                let keypair = Keypair::from_keypair_bytes(&bytes)
                    .map_err(|e| WalletError::Load(format!("{}: {e}", path.display())))?;
                Ok(Arc::new(keypair))
            }
        }
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<Address, WalletError> {
        let keypair = self.load()?;
        let address = keypair.address();
        *self.active.write() = Some(keypair);
        tracing::info!(wallet = %self.name, %address, "wallet connected");
        Ok(address)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        if self.active.write().take().is_some() {
            tracing::info!(wallet = %self.name, "wallet disconnected");
        }
        Ok(())
    }

    fn public_key(&self) -> Option<Address> {
        self.active.read().as_ref().map(|k| k.address())
    }

    async fn send_transaction(&self, mut tx: Transaction, rpc: &dyn Rpc) -> Result<Signature, WalletError> {
        let keypair = self.active.read().clone().ok_or(WalletError::NotConnected)?;
        if tx.message.payer() != Some(&keypair.address()) {
            return Err(WalletError::Rejected(
                "transaction fee payer is not this wallet".into(),
            ));
        }

        let blockhash = if tx.message.recent_blockhash == Hash::ZERO {
            rpc.get_latest_checkpoint().await?.blockhash
        } else {
            tx.message.recent_blockhash
        };
        tx.sign(&[keypair.as_ref()], blockhash)?;
        Ok(rpc.send_transaction(&tx).await?)
    }
}
