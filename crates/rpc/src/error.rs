//! RPC error types.

use solflow_core::{Signature, TransactionError};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by an [`Rpc`](crate::Rpc) implementation.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("transaction {signature} failed: {reason}")]
    TransactionFailed { signature: Signature, reason: String },

    #[error(
        "blockhash expired before {signature} was confirmed \
         (block height {block_height} > {last_valid_block_height})"
    )]
    Expired {
        signature: Signature,
        block_height: u64,
        last_valid_block_height: u64,
    },

    #[error("timed out after {0:?} waiting for confirmation")]
    Timeout(Duration),
}

impl RpcError {
    /// Build a JSON-RPC error.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }
}

/// Result type for RPC operations.
pub type Result<T> = std::result::Result<T, RpcError>;

/// JSON-RPC error codes, following the values Solana nodes return.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const NODE_UNHEALTHY: i64 = -32005;
    pub const SIGNATURE_VERIFICATION_FAILURE: i64 = -32003;
    pub const SEND_TRANSACTION_PREFLIGHT_FAILURE: i64 = -32002;
    pub const SIGNATURE_NOT_FOUND: i64 = -32009;
}
