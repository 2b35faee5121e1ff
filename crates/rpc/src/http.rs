//! JSON-RPC 2.0 client for Solana-compatible nodes.

use crate::client::Rpc;
use crate::error::{Result, RpcError};
use crate::types::{Checkpoint, Commitment, SignatureStatus};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use solflow_core::{Address, Signature, Transaction};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A JSON-RPC client over HTTP.
pub struct HttpRpc {
    client: reqwest::Client,
    url: String,
    commitment: Commitment,
    poll_interval: Duration,
    confirm_timeout: Duration,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct Response<T> {
    result: Option<T>,
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusWire {
    slot: u64,
    confirmations: Option<u64>,
    err: Option<Value>,
    confirmation_status: Option<Commitment>,
}

impl HttpRpc {
    /// Create a client for `url` at `confirmed` commitment.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            commitment: Commitment::Confirmed,
            poll_interval: Duration::from_millis(500),
            confirm_timeout: Duration::from_secs(60),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// The endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one JSON-RPC call and decode its `result`.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(method, id, "rpc request");

        // A hung node must not outlive the confirmation budget.
        let resp = self
            .client
            .post(&self.url)
            .timeout(self.confirm_timeout)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        let decoded: Response<T> = serde_json::from_str(&text).map_err(|e| {
            RpcError::InvalidResponse(format!("{method}: HTTP {status}: {e}"))
        })?;

        if let Some(err) = decoded.error {
            return Err(RpcError::rpc(err.code, err.message));
        }
        decoded
            .result
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: missing result")))
    }

    fn config(&self) -> Value {
        json!({ "commitment": self.commitment })
    }
}

fn parse_signature(method: &str, s: &str) -> Result<Signature> {
    Signature::from_base58(s)
        .map_err(|_| RpcError::InvalidResponse(format!("{method}: bad signature {s:?}")))
}

#[async_trait]
impl Rpc for HttpRpc {
    fn commitment(&self) -> Commitment {
        self.commitment
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn confirm_timeout(&self) -> Duration {
        self.confirm_timeout
    }

    async fn get_balance(&self, address: &Address) -> Result<u64> {
        let resp: WithContext<u64> = self
            .call("getBalance", json!([address.to_base58(), self.config()]))
            .await?;
        Ok(resp.value)
    }

    async fn request_airdrop(&self, address: &Address, lamports: u64) -> Result<Signature> {
        let sig: String = self
            .call(
                "requestAirdrop",
                json!([address.to_base58(), lamports, self.config()]),
            )
            .await?;
        parse_signature("requestAirdrop", &sig)
    }

    async fn get_latest_checkpoint(&self) -> Result<Checkpoint> {
        let resp: WithContext<Checkpoint> = self
            .call("getLatestBlockhash", json!([self.config()]))
            .await?;
        Ok(resp.value)
    }

    async fn get_block_height(&self) -> Result<u64> {
        self.call("getBlockHeight", json!([self.config()])).await
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        let sig: String = self
            .call(
                "sendTransaction",
                json!([
                    tx.to_base64(),
                    { "encoding": "base64", "preflightCommitment": self.commitment },
                ]),
            )
            .await?;
        parse_signature("sendTransaction", &sig)
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<Option<SignatureStatus>> {
        let resp: WithContext<Vec<Option<StatusWire>>> = self
            .call(
                "getSignatureStatuses",
                json!([[signature.to_base58()], { "searchTransactionHistory": true }]),
            )
            .await?;
        let status = resp.value.into_iter().next().flatten().map(|s| SignatureStatus {
            slot: s.slot,
            confirmations: s.confirmations,
            err: s.err.map(|e| match e {
                Value::String(reason) => reason,
                other => other.to_string(),
            }),
            confirmation_status: s.confirmation_status,
        });
        Ok(status)
    }
}
