//! Keypair and wallet flows for solflow.
//!
//! This crate holds everything between a user action and the network:
//! - **Identity**: a local keypair or a connected wallet adapter
//! - **Transfer**: validate, build, sign or delegate, submit, confirm
//! - **Balance**: fetch, auto-fund an empty account once, display
//! - **Signer**: sign a message and verify it locally
//! - **Session**: owns the injected RPC client, the current identity, the
//!   in-flight guard and the per-identity ordering lane
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use solflow_client::{ClientConfig, Session, TracingNotifier, TransferRequest};
//! use solflow_rpc::LocalCluster;
//!
//! # async fn demo() {
//! let session = Session::new(
//!     Arc::new(LocalCluster::new()),
//!     ClientConfig::default(),
//!     Arc::new(TracingNotifier),
//! );
//!
//! let address = session.create_funded_identity().await.unwrap();
//! println!("{address}: {}", session.balance().unwrap());
//!
//! let recipient = solflow_core::Keypair::generate().address().to_string();
//! let id = session.send(&TransferRequest::new(recipient, "0.5")).await.unwrap();
//! println!("{}", session.config().explorer_link(&id));
//! # }
//! ```

pub mod balance;
pub mod config;
pub mod error;
pub mod identity;
pub mod notify;
pub mod session;
pub mod signer;
pub mod transfer;

// Re-export commonly used types
pub use balance::{fetch_balance, fund, refresh_balance, BalanceSnapshot, FundingPolicy};
pub use config::{ClientConfig, ConfigError};
pub use error::{ActionError, ErrorKind};
pub use identity::{Identity, KeypairWallet, WalletAdapter, WalletError};
pub use notify::{Level, MemoryNotifier, Notification, Notifier, TracingNotifier};
pub use session::{Action, Session};
pub use signer::{sign_message, verify_message};
pub use transfer::{submit_transfer, SubmissionState, TransferRequest, ValidatedTransfer};
