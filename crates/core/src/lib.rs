//! Core primitives for solflow.
//!
//! This crate provides the types shared by the RPC client, the local test
//! network and the client flows:
//! - Cryptographic primitives (keypairs, addresses, signatures)
//! - Blockhashes used as transaction checkpoints
//! - Unit conversion between SOL and lamports
//! - System transfer instructions
//! - Legacy transaction messages and their wire encoding

pub mod crypto;
pub mod hash;
pub mod instruction;
pub mod short_vec;
pub mod transaction;
pub mod units;

// Re-export commonly used types at the crate root
pub use crypto::{Address, CryptoError, Keypair, Signature};
pub use hash::{hash_concat, Hash};
pub use instruction::{AccountMeta, Instruction, SystemInstruction, SYSTEM_PROGRAM_ID};
pub use transaction::{Message, MessageHeader, Transaction, TransactionError};
pub use units::{format_sol, parse_sol, AmountError, LAMPORTS_PER_SOL};
