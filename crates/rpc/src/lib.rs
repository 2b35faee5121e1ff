//! Network RPC boundary for solflow.
//!
//! Every flow talks to the network through the [`Rpc`] trait, which is
//! constructed once per session and injected where it is needed:
//! - [`HttpRpc`]: JSON-RPC 2.0 over HTTP against a Solana-compatible node
//! - [`LocalCluster`]: an in-memory test network with a built-in faucet
//!
//! # Example
//!
//! ```rust,no_run
//! use solflow_core::{Keypair, Transaction, LAMPORTS_PER_SOL};
//! use solflow_rpc::{HttpRpc, Rpc};
//!
//! # async fn demo() -> solflow_rpc::Result<()> {
//! let rpc = HttpRpc::new("https://api.devnet.solana.com");
//! let payer = Keypair::generate();
//!
//! let airdrop = rpc.request_airdrop(&payer.address(), LAMPORTS_PER_SOL).await?;
//! let checkpoint = rpc.get_latest_checkpoint().await?;
//! rpc.confirm_submission(&airdrop, &checkpoint).await?;
//!
//! let recipient = Keypair::generate().address();
//! let mut tx = Transaction::transfer(&payer.address(), &recipient, LAMPORTS_PER_SOL / 2);
//! let id = rpc.send_and_confirm(&mut tx, &[&payer]).await?;
//! println!("settled: {id}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod local;
pub mod types;

// Re-export commonly used types
pub use client::Rpc;
pub use error::{codes, Result, RpcError};
pub use http::HttpRpc;
pub use local::{CallCounts, LocalCluster, LocalConfig};
pub use types::{Checkpoint, Commitment, SignatureStatus};
