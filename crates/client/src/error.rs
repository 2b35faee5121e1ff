//! Action error taxonomy.

use crate::identity::WalletError;
use solflow_core::CryptoError;
use solflow_rpc::RpcError;
use thiserror::Error;

/// Errors surfaced by user actions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A precondition was not met: no identity, or an empty or invalid
    /// field. No network call was made.
    #[error("{0}")]
    MissingInput(String),

    #[error("network failure: {0}")]
    NetworkFailure(#[from] RpcError),

    #[error("wallet failure: {0}")]
    WalletFailure(#[from] WalletError),

    #[error("signature failure: {0}")]
    SignatureFailure(#[from] CryptoError),

    /// Another action on this session has not finished yet.
    #[error("another action is already in progress")]
    Busy,
}

/// Coarse classification of an [`ActionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingInput,
    NetworkFailure,
    SignatureFailure,
    Busy,
}

impl ActionError {
    pub fn missing(reason: impl Into<String>) -> Self {
        Self::MissingInput(reason.into())
    }

    /// Wallet rejections and wallet-side RPC errors count as network
    /// failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::MissingInput(_) => ErrorKind::MissingInput,
            ActionError::NetworkFailure(_) | ActionError::WalletFailure(_) => {
                ErrorKind::NetworkFailure
            }
            ActionError::SignatureFailure(_) => ErrorKind::SignatureFailure,
            ActionError::Busy => ErrorKind::Busy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ActionError::missing("x").kind(), ErrorKind::MissingInput);
        assert_eq!(
            ActionError::from(RpcError::rpc(-32005, "down")).kind(),
            ErrorKind::NetworkFailure
        );
        assert_eq!(
            ActionError::from(WalletError::NotConnected).kind(),
            ErrorKind::NetworkFailure
        );
        assert_eq!(
            ActionError::from(CryptoError::VerificationFailed).kind(),
            ErrorKind::SignatureFailure
        );
        assert_eq!(ActionError::Busy.kind(), ErrorKind::Busy);
    }

    #[test]
    fn test_missing_input_message_is_the_reason() {
        assert_eq!(
            ActionError::missing("Fill in all fields").to_string(),
            "Fill in all fields"
        );
    }
}
