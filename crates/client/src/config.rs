//! Client configuration.

use serde::{Deserialize, Serialize};
use solflow_core::{Signature, LAMPORTS_PER_SOL};
use solflow_rpc::{Commitment, HttpRpc};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Public devnet endpoint.
pub const DEVNET_URL: &str = "https://api.devnet.solana.com";

/// Default explorer template; `{signature}` is replaced with the id.
pub const DEVNET_EXPLORER: &str = "https://solscan.io/tx/{signature}?cluster=devnet";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for a session.
///
/// Every field has a default, so a config file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Commitment level for reads and confirmations.
    pub commitment: Commitment,
    /// Faucet credit requested when funding an empty account.
    pub airdrop_lamports: u64,
    /// Explorer URL template containing `{signature}`.
    pub explorer_url: String,
    /// Delay between confirmation polls.
    pub poll_interval_ms: u64,
    /// Upper bound on a single confirmation wait.
    pub confirm_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEVNET_URL.to_string(),
            commitment: Commitment::Confirmed,
            airdrop_lamports: LAMPORTS_PER_SOL,
            explorer_url: DEVNET_EXPLORER.to_string(),
            poll_interval_ms: 500,
            confirm_timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make every action fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "rpc_url must be an http(s) URL, got {:?}",
                self.rpc_url
            )));
        }
        if self.airdrop_lamports == 0 {
            return Err(ConfigError::Invalid(
                "airdrop_lamports must be greater than zero".into(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self.confirm_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "confirm_timeout_secs must be greater than zero".into(),
            ));
        }
        if !self.explorer_url.contains("{signature}") {
            return Err(ConfigError::Invalid(
                "explorer_url must contain {signature}".into(),
            ));
        }
        Ok(())
    }

    /// Build an HTTP client for the configured endpoint.
    pub fn http_client(&self) -> HttpRpc {
        HttpRpc::new(self.rpc_url.clone())
            .with_commitment(self.commitment)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_confirm_timeout(Duration::from_secs(self.confirm_timeout_secs))
    }

    /// Explorer link for a transaction.
    pub fn explorer_link(&self, signature: &Signature) -> String {
        self.explorer_url
            .replace("{signature}", &signature.to_base58())
    }
}
