//! Message signing with a local self-check.

use crate::error::ActionError;
use solflow_core::{Address, Keypair, Signature};

/// Sign the UTF-8 bytes of `message` and verify the result against the
/// keypair's public key before returning it.
pub fn sign_message(keypair: &Keypair, message: &str) -> Result<Signature, ActionError> {
    let bytes = message.as_bytes();
    let signature = keypair.sign(bytes);
    keypair.address().verify(bytes, &signature)?;
    tracing::debug!(address = %keypair.address(), len = bytes.len(), "message signed");
    Ok(signature)
}

/// Verify a detached signature over `message` by `address`.
pub fn verify_message(address: &Address, message: &str, signature: &Signature) -> Result<(), ActionError> {
    address.verify(message.as_bytes(), signature)?;
    Ok(())
}
