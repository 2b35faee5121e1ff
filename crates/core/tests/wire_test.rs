//! Byte layout of a signed system transfer.

use solflow_core::{
    hash_concat, Keypair, MessageHeader, SystemInstruction, Transaction, TransactionError,
    LAMPORTS_PER_SOL,
};

#[test]
fn test_transfer_wire_layout() {
    let sender = Keypair::from_seed(&[11u8; 32]);
    let recipient = Keypair::from_seed(&[22u8; 32]).address();
    let blockhash = hash_concat(&[b"layout"]);
    let lamports = LAMPORTS_PER_SOL / 2;

    let mut tx = Transaction::transfer(&sender.address(), &recipient, lamports);
    tx.sign(&[&sender], blockhash).unwrap();
    let bytes = tx.serialize();

    // Signatures.
    assert_eq!(bytes[0], 1);
    assert_eq!(&bytes[1..65], tx.signatures[0].as_bytes());

    // Message: header, keys, blockhash, instructions.
    let message = &bytes[65..];
    assert_eq!(message, tx.message.serialize().as_slice());
    assert_eq!(&message[0..3], &[1, 0, 1]);
    assert_eq!(message[3], 3);
    assert_eq!(&message[4..36], sender.address().as_bytes());
    assert_eq!(&message[36..68], recipient.as_bytes());
    assert_eq!(&message[68..100], &[0u8; 32]);
    assert_eq!(&message[100..132], blockhash.as_bytes());

    let mut data = vec![2, 0, 0, 0];
    data.extend_from_slice(&lamports.to_le_bytes());
    let mut instruction = vec![1, 2, 2, 0, 1, 12];
    instruction.extend_from_slice(&data);
    assert_eq!(&message[132..], instruction.as_slice());

    // The fee payer's signature covers exactly the message bytes.
    assert!(sender.address().verify(message, &tx.signatures[0]).is_ok());
    assert_eq!(
        SystemInstruction::decode(&data),
        Some(SystemInstruction::Transfer { lamports })
    );
}

#[test]
fn test_deterministic_signing() {
    let sender = Keypair::from_seed(&[1u8; 32]);
    let recipient = Keypair::from_seed(&[2u8; 32]).address();

    let sign = || {
        let mut tx = Transaction::transfer(&sender.address(), &recipient, 42);
        tx.sign(&[&sender], hash_concat(&[b"same"])).unwrap();
        tx
    };
    assert_eq!(sign().id(), sign().id());
    assert_eq!(sign().to_base64(), sign().to_base64());
}

#[test]
fn test_rejects_bad_header() {
    let sender = Keypair::from_seed(&[3u8; 32]);
    let recipient = Keypair::from_seed(&[4u8; 32]).address();
    let blockhash = hash_concat(&[b"header"]);

    for header in [
        // More read-only signers than signers.
        MessageHeader {
            num_required_signatures: 1,
            num_readonly_signed_accounts: 2,
            num_readonly_unsigned_accounts: 0,
        },
        // More read-only non-signers than non-signers.
        MessageHeader {
            num_required_signatures: 1,
            num_readonly_signed_accounts: 0,
            num_readonly_unsigned_accounts: 3,
        },
    ] {
        let mut tx = Transaction::transfer(&sender.address(), &recipient, 10);
        tx.message.header = header;
        tx.sign(&[&sender], blockhash).unwrap();

        assert!(matches!(
            Transaction::from_base64(&tx.to_base64()),
            Err(TransactionError::Malformed(_))
        ));
        // Built in memory rather than decoded, the message still answers
        // without overflowing.
        let _ = tx.message.is_writable(0);
        assert_eq!(tx.as_system_transfer().map(|(_, _, l)| l), Some(10));
    }
}
