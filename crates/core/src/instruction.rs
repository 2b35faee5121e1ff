//! Instructions and the system program's transfer instruction.

use crate::crypto::Address;
use serde::{Deserialize, Serialize};

/// Address of the system program, which owns plain wallet accounts.
pub const SYSTEM_PROGRAM_ID: Address = Address::ZERO;

/// An account referenced by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub address: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account.
    pub fn new(address: Address, is_signer: bool) -> Self {
        Self {
            address,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account.
    pub fn new_readonly(address: Address, is_signer: bool) -> Self {
        Self {
            address,
            is_signer,
            is_writable: false,
        }
    }
}

/// A single program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// System program instructions.
///
/// The on-wire instruction data is the bincode encoding of this enum: a
/// little-endian `u32` variant index followed by the fields. Variant order
/// is therefore part of the format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemInstruction {
    CreateAccount {
        lamports: u64,
        space: u64,
        owner: [u8; 32],
    },
    Assign {
        owner: [u8; 32],
    },
    Transfer {
        lamports: u64,
    },
}

impl SystemInstruction {
    /// Build a transfer of `lamports` from `from` to `to`.
    pub fn transfer(from: &Address, to: &Address, lamports: u64) -> Instruction {
        let data = bincode::serialize(&SystemInstruction::Transfer { lamports })
            .expect("serialization should not fail");
        Instruction {
            program_id: SYSTEM_PROGRAM_ID,
            accounts: vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
            data,
        }
    }

    /// Decode system instruction data.
    pub fn decode(data: &[u8]) -> Option<Self> {
        bincode::deserialize(data).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_data_layout() {
        let from = Address::from_bytes([1u8; 32]);
        let to = Address::from_bytes([2u8; 32]);
        let ix = SystemInstruction::transfer(&from, &to, 1_000_000_000);

        assert_eq!(ix.program_id, SYSTEM_PROGRAM_ID);
        let mut expected = vec![2, 0, 0, 0];
        expected.extend_from_slice(&1_000_000_000u64.to_le_bytes());
        assert_eq!(ix.data, expected);
    }

    #[test]
    fn test_transfer_accounts() {
        let from = Address::from_bytes([1u8; 32]);
        let to = Address::from_bytes([2u8; 32]);
        let ix = SystemInstruction::transfer(&from, &to, 5);

        assert_eq!(ix.accounts.len(), 2);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert!(!ix.accounts[1].is_signer && ix.accounts[1].is_writable);
    }

    #[test]
    fn test_decode_transfer() {
        let ix = SystemInstruction::transfer(&Address::ZERO, &Address::ZERO, 42);
        assert_eq!(
            SystemInstruction::decode(&ix.data),
            Some(SystemInstruction::Transfer { lamports: 42 })
        );
        assert_eq!(SystemInstruction::decode(&[9, 0, 0, 0]), None);
        assert_eq!(SystemInstruction::decode(&[2, 0]), None);
    }
}
