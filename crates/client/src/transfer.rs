//! The transfer flow.

use crate::error::ActionError;
use crate::identity::Identity;
use solflow_core::{parse_sol, Address, AmountError, Signature, Transaction};
use solflow_rpc::Rpc;

/// A transfer as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRequest {
    /// Recipient address in base58.
    pub recipient: String,
    /// Amount in whole SOL, e.g. `"0.5"`.
    pub amount: String,
}

/// A transfer whose fields have been checked and converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedTransfer {
    pub recipient: Address,
    pub lamports: u64,
}

impl TransferRequest {
    pub fn new(recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    /// Check the fields and convert the amount to lamports.
    pub fn validate(&self) -> Result<ValidatedTransfer, ActionError> {
        if self.recipient.trim().is_empty() || self.amount.trim().is_empty() {
            return Err(ActionError::missing("Fill in all fields"));
        }
        let recipient = Address::from_base58(&self.recipient)
            .map_err(|_| ActionError::missing("Recipient is not a valid address"))?;
        let lamports = parse_sol(&self.amount).map_err(|e| match e {
            AmountError::NotPositive => ActionError::missing("Amount must be greater than zero"),
            other => ActionError::missing(format!("Invalid amount: {other}")),
        })?;
        Ok(ValidatedTransfer {
            recipient,
            lamports,
        })
    }
}

/// Progress of a user-initiated submission.
///
/// `Idle -> Submitting -> Settled | Failed -> Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Settled(Signature),
    Failed(String),
}

impl SubmissionState {
    /// `Idle -> Submitting`. Returns false from any other state.
    pub fn start(&mut self) -> bool {
        if *self != SubmissionState::Idle {
            return false;
        }
        *self = SubmissionState::Submitting;
        true
    }

    /// `Submitting -> Settled | Failed`. Ignored from any other state.
    pub fn finish(&mut self, outcome: Result<Signature, String>) -> bool {
        if *self != SubmissionState::Submitting {
            return false;
        }
        *self = match outcome {
            Ok(signature) => SubmissionState::Settled(signature),
            Err(reason) => SubmissionState::Failed(reason),
        };
        true
    }

    /// Return to `Idle`, yielding the terminal state that was reported.
    pub fn reset(&mut self) -> Option<SubmissionState> {
        if self.is_terminal() {
            Some(std::mem::take(self))
        } else {
            None
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Settled(_) | SubmissionState::Failed(_))
    }

    pub fn is_submitting(&self) -> bool {
        *self == SubmissionState::Submitting
    }
}

/// Validate, build, sign, submit and confirm a transfer.
///
/// Preconditions are checked before any network call. A local keypair signs
/// through [`Rpc::send_and_confirm`]; a wallet identity gets the checkpoint
/// here and delegates signing and submission to its adapter.
///
/// There is no deduplication: calling this twice sends two transfers.
pub async fn submit_transfer(
    rpc: &dyn Rpc,
    identity: Option<&Identity>,
    request: &TransferRequest,
) -> Result<Signature, ActionError> {
    let identity =
        identity.ok_or_else(|| ActionError::missing("Create a keypair or connect a wallet first"))?;
    let transfer = request.validate()?;
    let sender = identity.address();
    let mut tx = Transaction::transfer(&sender, &transfer.recipient, transfer.lamports);
    tracing::info!(
        %sender,
        recipient = %transfer.recipient,
        lamports = transfer.lamports,
        "submitting transfer"
    );

    let signature = match identity {
        Identity::Local(keypair) => rpc.send_and_confirm(&mut tx, &[keypair.as_ref()]).await?,
        Identity::Wallet { adapter, .. } => {
            let checkpoint = rpc.get_latest_checkpoint().await?;
            tx.message.recent_blockhash = checkpoint.blockhash;
            let signature = adapter.send_transaction(tx, rpc).await?;
            rpc.confirm_submission(&signature, &checkpoint).await?;
            signature
        }
    };

    tracing::info!(%signature, "transfer confirmed");
    Ok(signature)
}
