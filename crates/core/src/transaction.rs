//! Transaction messages, signing and the legacy wire format.
//!
//! Wire layout of a transaction:
//!
//! ```text
//! compact-u16 n | n x 64-byte signature | message
//!
//! message:
//!   u8 num_required_signatures
//!   u8 num_readonly_signed_accounts
//!   u8 num_readonly_unsigned_accounts
//!   compact-u16 k | k x 32-byte account key
//!   32-byte recent blockhash
//!   compact-u16 m | m x instruction
//!
//! instruction:
//!   u8 program_id_index
//!   compact-u16 a | a x u8 account index
//!   compact-u16 d | d bytes of data
//! ```

use crate::crypto::{Address, Keypair, Signature};
use crate::hash::Hash;
use crate::instruction::{AccountMeta, Instruction, SystemInstruction, SYSTEM_PROGRAM_ID};
use crate::short_vec;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("not enough signers for the message")]
    NotEnoughSigners,
    #[error("keypair {0} is not a required signer")]
    KeypairMismatch(Address),
    #[error("missing signature")]
    MissingSignature,
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("too many accounts or instructions")]
    TooLarge,
    #[error("malformed transaction: {0}")]
    Malformed(&'static str),
}

/// Counts that split `account_keys` into signer/writable groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

/// An instruction whose accounts are indexes into the message's keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

/// The signed portion of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Address>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile instructions into a message paid for by `payer`.
    ///
    /// Keys are ordered: writable signers (payer first), read-only signers,
    /// writable non-signers, read-only non-signers.
    pub fn new(instructions: &[Instruction], payer: &Address) -> Result<Self, TransactionError> {
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::new(*payer, true)];
        let mut merge = |meta: AccountMeta| {
            match metas.iter_mut().find(|m| m.address == meta.address) {
                Some(existing) => {
                    existing.is_signer |= meta.is_signer;
                    existing.is_writable |= meta.is_writable;
                }
                None => metas.push(meta),
            }
        };
        for ix in instructions {
            for meta in &ix.accounts {
                merge(*meta);
            }
            merge(AccountMeta::new_readonly(ix.program_id, false));
        }

        let group = |signer: bool, writable: bool| {
            metas
                .iter()
                .filter(move |m| m.is_signer == signer && m.is_writable == writable)
                .map(|m| m.address)
        };
        let account_keys: Vec<Address> = group(true, true)
            .chain(group(true, false))
            .chain(group(false, true))
            .chain(group(false, false))
            .collect();
        if account_keys.len() > u8::MAX as usize {
            return Err(TransactionError::TooLarge);
        }

        let count = |signer: bool, writable: bool| group(signer, writable).count() as u8;
        let header = MessageHeader {
            num_required_signatures: count(true, true) + count(true, false),
            num_readonly_signed_accounts: count(true, false),
            num_readonly_unsigned_accounts: count(false, false),
        };

        let index_of = |address: &Address| {
            account_keys
                .iter()
                .position(|k| k == address)
                .map(|i| i as u8)
                .ok_or(TransactionError::Malformed("instruction account not in keys"))
        };
        let instructions = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: index_of(&ix.program_id)?,
                    accounts: ix
                        .accounts
                        .iter()
                        .map(|m| index_of(&m.address))
                        .collect::<Result<_, _>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>, TransactionError>>()?;

        Ok(Self {
            header,
            account_keys,
            recent_blockhash: Hash::ZERO,
            instructions,
        })
    }

    /// The fee payer (first account key).
    pub fn payer(&self) -> Option<&Address> {
        self.account_keys.first()
    }

    /// Keys whose signatures are required.
    pub fn signer_keys(&self) -> &[Address] {
        let n = (self.header.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Whether the account at `index` may be modified.
    pub fn is_writable(&self, index: usize) -> bool {
        let signers = self.header.num_required_signatures as usize;
        let keys = self.account_keys.len();
        if index < signers {
            index < signers.saturating_sub(self.header.num_readonly_signed_accounts as usize)
        } else {
            index < keys.saturating_sub(self.header.num_readonly_unsigned_accounts as usize)
        }
    }

    /// Expand compiled instructions back into addressed instructions.
    pub fn decompile(&self) -> Result<Vec<Instruction>, TransactionError> {
        let key = |i: u8| {
            self.account_keys
                .get(i as usize)
                .copied()
                .ok_or(TransactionError::Malformed("account index out of range"))
        };
        self.instructions
            .iter()
            .map(|ix| {
                let accounts = ix
                    .accounts
                    .iter()
                    .map(|&i| {
                        Ok(AccountMeta {
                            address: key(i)?,
                            is_signer: (i as usize) < self.header.num_required_signatures as usize,
                            is_writable: self.is_writable(i as usize),
                        })
                    })
                    .collect::<Result<_, TransactionError>>()?;
                Ok(Instruction {
                    program_id: key(ix.program_id_index)?,
                    accounts,
                    data: ix.data.clone(),
                })
            })
            .collect()
    }

    /// Serialize the message (the bytes that get signed).
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + 32 * self.account_keys.len());
        out.push(self.header.num_required_signatures);
        out.push(self.header.num_readonly_signed_accounts);
        out.push(self.header.num_readonly_unsigned_accounts);
        short_vec::encode_len(self.account_keys.len() as u16, &mut out);
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(self.recent_blockhash.as_bytes());
        short_vec::encode_len(self.instructions.len() as u16, &mut out);
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            short_vec::encode_len(ix.accounts.len() as u16, &mut out);
            out.extend_from_slice(&ix.accounts);
            short_vec::encode_len(ix.data.len() as u16, &mut out);
            out.extend_from_slice(&ix.data);
        }
        out
    }

    fn deserialize(reader: &mut Reader<'_>) -> Result<Self, TransactionError> {
        let header = MessageHeader {
            num_required_signatures: reader.u8()?,
            num_readonly_signed_accounts: reader.u8()?,
            num_readonly_unsigned_accounts: reader.u8()?,
        };
        let key_count = reader.len()?;
        let account_keys = (0..key_count)
            .map(|_| reader.array::<32>().map(Address::from_bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let recent_blockhash = Hash::from_bytes(reader.array::<32>()?);
        let ix_count = reader.len()?;
        let instructions = (0..ix_count)
            .map(|_| {
                let program_id_index = reader.u8()?;
                let n = reader.len()?;
                let accounts = reader.bytes(n)?.to_vec();
                let d = reader.len()?;
                let data = reader.bytes(d)?.to_vec();
                Ok(CompiledInstruction {
                    program_id_index,
                    accounts,
                    data,
                })
            })
            .collect::<Result<Vec<_>, TransactionError>>()?;

        let signers = header.num_required_signatures as usize;
        if signers > account_keys.len() {
            return Err(TransactionError::Malformed("more signers than keys"));
        }
        if header.num_readonly_signed_accounts as usize > signers {
            return Err(TransactionError::Malformed("more read-only signers than signers"));
        }
        if header.num_readonly_unsigned_accounts as usize > account_keys.len() - signers {
            return Err(TransactionError::Malformed("more read-only accounts than non-signers"));
        }
        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }
}

/// A message plus one signature per required signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl Transaction {
    /// Create an unsigned transaction with placeholder signatures.
    pub fn new_unsigned(message: Message) -> Self {
        let n = message.header.num_required_signatures as usize;
        Self {
            signatures: vec![Signature::default(); n],
            message,
        }
    }

    /// Create an unsigned transfer of `lamports` from `from` to `to`.
    pub fn transfer(from: &Address, to: &Address, lamports: u64) -> Self {
        let ix = SystemInstruction::transfer(from, to, lamports);
        // A single two-account instruction always compiles.
        let message = Message::new(&[ix], from).expect("transfer message should compile");
        Self::new_unsigned(message)
    }

    /// Set the recent blockhash and sign with every required signer.
    ///
    /// Changing the blockhash invalidates any earlier signatures, so all
    /// signers must be supplied together.
    pub fn sign(&mut self, signers: &[&Keypair], recent_blockhash: Hash) -> Result<(), TransactionError> {
        let required = self.message.signer_keys().to_vec();
        for signer in signers {
            if !required.contains(&signer.address()) {
                return Err(TransactionError::KeypairMismatch(signer.address()));
            }
        }

        self.message.recent_blockhash = recent_blockhash;
        let bytes = self.message.serialize();
        let mut signatures = Vec::with_capacity(required.len());
        for key in &required {
            let signer = signers
                .iter()
                .find(|s| s.address() == *key)
                .ok_or(TransactionError::NotEnoughSigners)?;
            signatures.push(signer.sign(&bytes));
        }
        self.signatures = signatures;
        Ok(())
    }

    /// Whether every required signature is present.
    pub fn is_signed(&self) -> bool {
        self.signatures.len() == self.message.header.num_required_signatures as usize
            && self.signatures.iter().all(|s| !s.is_default())
    }

    /// Verify every signature against its signer key.
    pub fn verify(&self) -> Result<(), TransactionError> {
        if !self.is_signed() {
            return Err(TransactionError::MissingSignature);
        }
        let bytes = self.message.serialize();
        for (sig, key) in self.signatures.iter().zip(self.message.signer_keys()) {
            key.verify(&bytes, sig)
                .map_err(|_| TransactionError::VerificationFailed)?;
        }
        Ok(())
    }

    /// The transaction id: its first (fee payer) signature.
    pub fn id(&self) -> Option<Signature> {
        self.signatures.first().copied().filter(|s| !s.is_default())
    }

    /// If this is a single system transfer, return `(from, to, lamports)`.
    pub fn as_system_transfer(&self) -> Option<(Address, Address, u64)> {
        let instructions = self.message.decompile().ok()?;
        let [ix] = instructions.as_slice() else {
            return None;
        };
        if ix.program_id != SYSTEM_PROGRAM_ID || ix.accounts.len() != 2 {
            return None;
        }
        match SystemInstruction::decode(&ix.data)? {
            SystemInstruction::Transfer { lamports } => {
                Some((ix.accounts[0].address, ix.accounts[1].address, lamports))
            }
            _ => None,
        }
    }

    /// Serialize to wire bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        short_vec::encode_len(self.signatures.len() as u16, &mut out);
        for sig in &self.signatures {
            out.extend_from_slice(sig.as_bytes());
        }
        out.extend_from_slice(&self.message.serialize());
        out
    }

    /// Parse wire bytes. Trailing bytes are rejected.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = Reader { bytes, pos: 0 };
        let sig_count = reader.len()?;
        let signatures = (0..sig_count)
            .map(|_| reader.array::<64>().map(Signature::from_bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let message = Message::deserialize(&mut reader)?;
        if reader.pos != bytes.len() {
            return Err(TransactionError::Malformed("trailing bytes"));
        }
        if signatures.len() != message.header.num_required_signatures as usize {
            return Err(TransactionError::Malformed("signature count mismatch"));
        }
        Ok(Self {
            signatures,
            message,
        })
    }

    /// Wire bytes as base64, the encoding used by `sendTransaction`.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.serialize())
    }

    /// Parse a base64 wire transaction.
    pub fn from_base64(s: &str) -> Result<Self, TransactionError> {
        let bytes = BASE64
            .decode(s)
            .map_err(|_| TransactionError::Malformed("invalid base64"))?;
        Self::deserialize(&bytes)
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, n: usize) -> Result<&'a [u8], TransactionError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(TransactionError::Malformed("unexpected end of input"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, TransactionError> {
        Ok(self.bytes(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], TransactionError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.bytes(N)?);
        Ok(arr)
    }

    fn len(&mut self) -> Result<usize, TransactionError> {
        let (len, used) = short_vec::decode_len(&self.bytes[self.pos..])
            .ok_or(TransactionError::Malformed("bad length prefix"))?;
        self.pos += used;
        Ok(len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash;

    #[test]
    fn test_transfer_message_layout() {
        let from = Address::from_bytes([1u8; 32]);
        let to = Address::from_bytes([2u8; 32]);
        let tx = Transaction::transfer(&from, &to, 1000);

        let msg = &tx.message;
        assert_eq!(
            msg.header,
            MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            }
        );
        assert_eq!(msg.account_keys, vec![from, to, SYSTEM_PROGRAM_ID]);
        assert_eq!(msg.instructions[0].program_id_index, 2);
        assert_eq!(msg.instructions[0].accounts, vec![0, 1]);
        assert!(msg.is_writable(0));
        assert!(msg.is_writable(1));
        assert!(!msg.is_writable(2));
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Keypair::generate();
        let to = Address::from_bytes([2u8; 32]);
        let mut tx = Transaction::transfer(&keypair.address(), &to, 1000);
        assert!(tx.id().is_none());
        assert!(matches!(tx.verify(), Err(TransactionError::MissingSignature)));

        tx.sign(&[&keypair], hash(b"recent")).unwrap();
        assert!(tx.is_signed());
        assert!(tx.verify().is_ok());
        assert_eq!(tx.id(), Some(tx.signatures[0]));
        assert_eq!(tx.message.recent_blockhash, hash(b"recent"));
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let sender = Keypair::generate();
        let stranger = Keypair::generate();
        let mut tx = Transaction::transfer(&sender.address(), &Address::ZERO, 1);

        assert!(matches!(
            tx.sign(&[&stranger], Hash::ZERO),
            Err(TransactionError::KeypairMismatch(_))
        ));
        assert!(matches!(
            tx.sign(&[], Hash::ZERO),
            Err(TransactionError::NotEnoughSigners)
        ));
    }

    #[test]
    fn test_new_blockhash_changes_id() {
        let keypair = Keypair::generate();
        let to = Address::from_bytes([3u8; 32]);
        let mut a = Transaction::transfer(&keypair.address(), &to, 10);
        let mut b = a.clone();
        a.sign(&[&keypair], hash(b"one")).unwrap();
        b.sign(&[&keypair], hash(b"two")).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_wire_roundtrip_and_decode() {
        let keypair = Keypair::generate();
        let to = Address::from_bytes([4u8; 32]);
        let mut tx = Transaction::transfer(&keypair.address(), &to, 500_000_000);
        tx.sign(&[&keypair], hash(b"bh")).unwrap();

        let bytes = tx.serialize();
        // 1 + 64 sig, 3 header, 1 + 3*32 keys, 32 blockhash,
        // 1 ix count, 1 program index, 1 + 2 accounts, 1 + 12 data.
        assert_eq!(bytes.len(), 65 + 3 + 97 + 32 + 1 + 1 + 3 + 13);

        let parsed = Transaction::from_base64(&tx.to_base64()).unwrap();
        assert_eq!(parsed, tx);
        assert!(parsed.verify().is_ok());
        assert_eq!(
            parsed.as_system_transfer(),
            Some((keypair.address(), to, 500_000_000))
        );
    }

    #[test]
    fn test_tampered_bytes_fail_verification() {
        let keypair = Keypair::generate();
        let to = Address::from_bytes([5u8; 32]);
        let mut tx = Transaction::transfer(&keypair.address(), &to, 7);
        tx.sign(&[&keypair], hash(b"bh")).unwrap();

        let mut bytes = tx.serialize();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = Transaction::deserialize(&bytes).unwrap();
        assert!(matches!(
            tampered.verify(),
            Err(TransactionError::VerificationFailed)
        ));
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(Transaction::deserialize(&[]).is_err());
        assert!(Transaction::deserialize(&[1, 0, 0]).is_err());
        assert!(Transaction::from_base64("%%%").is_err());

        let keypair = Keypair::generate();
        let mut tx = Transaction::transfer(&keypair.address(), &Address::ZERO, 1);
        tx.sign(&[&keypair], Hash::ZERO).unwrap();
        let mut bytes = tx.serialize();
        bytes.push(0);
        assert!(Transaction::deserialize(&bytes).is_err());
    }
}
