//! The user-facing session.
//!
//! A [`Session`] owns the injected RPC client, the current identity and
//! everything shown about it. Every action:
//! - is rejected with [`ActionError::Busy`] while another one is running;
//! - runs its network work on the identity's lane, so balance reads,
//!   funding and transfers for one identity happen in submission order;
//! - reports its outcome through the [`Notifier`] and returns it.

use crate::balance::{fetch_balance, fund, refresh_balance, BalanceSnapshot, FundingPolicy};
use crate::config::ClientConfig;
use crate::error::ActionError;
use crate::identity::{Identity, WalletAdapter};
use crate::notify::{Notification, Notifier};
use crate::signer;
use crate::transfer::{submit_transfer, SubmissionState, TransferRequest};
use parking_lot::{Mutex, RwLock};
use solflow_core::{Address, Keypair, Signature};
use solflow_rpc::Rpc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// A user action, for logging and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateIdentity,
    ConnectWallet,
    DisconnectWallet,
    Transfer,
    SignMessage,
    RefreshBalance,
}

impl Action {
    /// Message shown when the action succeeds, if any.
    pub fn success_message(&self) -> Option<&'static str> {
        match self {
            Action::CreateIdentity => Some("Keypair created and wallet funded successfully!"),
            Action::ConnectWallet => Some("Wallet connected"),
            Action::DisconnectWallet => Some("Wallet disconnected"),
            Action::Transfer => Some("Sol sent successfully!"),
            Action::SignMessage => Some("Message signed successfully!"),
            Action::RefreshBalance => None,
        }
    }

    /// Generic message shown when the action fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Action::CreateIdentity => "Failed to create and fund keypair",
            Action::ConnectWallet => "Failed to connect wallet",
            Action::DisconnectWallet => "Failed to disconnect wallet",
            Action::Transfer => "Failed to transfer sol",
            Action::SignMessage => "Failed to sign message",
            Action::RefreshBalance => "Failed to fetch balance",
        }
    }
}

/// Per-identity ordering lane.
struct Lane {
    identity: Identity,
    /// Held for the duration of every network operation on this identity.
    queue: tokio::sync::Mutex<()>,
    shown: Mutex<Option<BalanceSnapshot>>,
}

impl Lane {
    fn new(identity: Identity) -> Arc<Self> {
        Arc::new(Self {
            identity,
            queue: tokio::sync::Mutex::new(()),
            shown: Mutex::new(None),
        })
    }

    fn show(&self, snapshot: BalanceSnapshot) {
        *self.shown.lock() = Some(snapshot);
    }
}

/// Resets the in-flight flag on drop.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One user's session against one network.
pub struct Session {
    rpc: Arc<dyn Rpc>,
    config: ClientConfig,
    notifier: Arc<dyn Notifier>,
    lane: RwLock<Option<Arc<Lane>>>,
    in_flight: AtomicBool,
    state: watch::Sender<SubmissionState>,
    last_outcome: Mutex<Option<SubmissionState>>,
    last_transaction: Mutex<Option<Signature>>,
}

impl Session {
    pub fn new(rpc: Arc<dyn Rpc>, config: ClientConfig, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            rpc,
            config,
            notifier,
            lane: RwLock::new(None),
            in_flight: AtomicBool::new(false),
            state,
            last_outcome: Mutex::new(None),
            last_transaction: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn rpc(&self) -> &dyn Rpc {
        self.rpc.as_ref()
    }

    /// The current identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.current().map(|lane| lane.identity.clone())
    }

    pub fn identity_address(&self) -> Option<Address> {
        self.current().map(|lane| lane.identity.address())
    }

    /// The last balance shown for the current identity.
    pub fn balance(&self) -> Option<BalanceSnapshot> {
        self.current().and_then(|lane| *lane.shown.lock())
    }

    /// Id of the last settled transfer.
    pub fn last_transaction(&self) -> Option<Signature> {
        *self.last_transaction.lock()
    }

    /// Explorer link for the last settled transfer.
    pub fn explorer_link(&self) -> Option<String> {
        self.last_transaction()
            .map(|signature| self.config.explorer_link(&signature))
    }

    /// Current submission state.
    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    /// Watch submission state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// The terminal state reported by the last transfer.
    pub fn last_outcome(&self) -> Option<SubmissionState> {
        self.last_outcome.lock().clone()
    }

    /// Whether an action is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Generate a keypair, make it the identity, and fund it from the
    /// faucet.
    ///
    /// On failure the new identity stays installed and the shown balance
    /// keeps the last value read.
    pub async fn create_funded_identity(&self) -> Result<Address, ActionError> {
        let _guard = self.enter(Action::CreateIdentity)?;
        let result = self.generate_and_fund().await;
        self.report(Action::CreateIdentity, result)
    }

    async fn generate_and_fund(&self) -> Result<Address, ActionError> {
        let lane = self.install(Identity::local(Keypair::generate()));
        let address = lane.identity.address();
        let _queue = lane.queue.lock().await;

        lane.show(fetch_balance(self.rpc(), &address).await?);
        fund(self.rpc(), &address, self.config.airdrop_lamports).await?;
        lane.show(fetch_balance(self.rpc(), &address).await?);
        Ok(address)
    }

    /// Connect a wallet, make it the identity, and show its balance,
    /// funding it once if it is empty.
    pub async fn connect_wallet(&self, adapter: Arc<dyn WalletAdapter>) -> Result<Address, ActionError> {
        let _guard = self.enter(Action::ConnectWallet)?;
        let result = self.connect_and_refresh(adapter).await;
        self.report(Action::ConnectWallet, result)
    }

    async fn connect_and_refresh(&self, adapter: Arc<dyn WalletAdapter>) -> Result<Address, ActionError> {
        let address = adapter.connect().await?;
        let lane = match self.current() {
            Some(lane) if lane.identity.address() == address => lane,
            _ => self.install(Identity::Wallet { address, adapter }),
        };
        let _queue = lane.queue.lock().await;

        let policy = FundingPolicy::WhenEmpty {
            lamports: self.config.airdrop_lamports,
        };
        lane.show(refresh_balance(self.rpc(), &address, policy).await?);
        Ok(address)
    }

    /// Disconnect the current wallet and clear the identity.
    pub async fn disconnect_wallet(&self) -> Result<(), ActionError> {
        let _guard = self.enter(Action::DisconnectWallet)?;
        let result = self.disconnect().await;
        self.report(Action::DisconnectWallet, result)
    }

    async fn disconnect(&self) -> Result<(), ActionError> {
        let lane = self.current();
        let adapter = match lane.as_ref().map(|lane| &lane.identity) {
            Some(Identity::Wallet { adapter, .. }) => adapter.clone(),
            _ => return Err(ActionError::missing("No wallet connected")),
        };
        adapter.disconnect().await?;
        *self.lane.write() = None;
        *self.last_transaction.lock() = None;
        Ok(())
    }

    /// Send a transfer from the current identity.
    ///
    /// The submission state moves `Idle -> Submitting -> Settled | Failed`
    /// and back to `Idle` before this returns; the terminal state is kept
    /// in [`Session::last_outcome`].
    pub async fn send(&self, request: &TransferRequest) -> Result<Signature, ActionError> {
        let _guard = self.enter(Action::Transfer)?;

        self.state.send_modify(|state| {
            state.start();
        });
        let result = self.transfer_on_lane(request).await;
        let outcome = result.as_ref().copied().map_err(|e| e.to_string());
        self.state.send_modify(|state| {
            state.finish(outcome);
        });
        let mut reported = None;
        self.state.send_modify(|state| reported = state.reset());
        *self.last_outcome.lock() = reported;

        self.report(Action::Transfer, result)
    }

    async fn transfer_on_lane(&self, request: &TransferRequest) -> Result<Signature, ActionError> {
        let Some(lane) = self.current() else {
            return submit_transfer(self.rpc(), None, request).await;
        };
        let _queue = lane.queue.lock().await;

        let signature = submit_transfer(self.rpc(), Some(&lane.identity), request).await?;
        *self.last_transaction.lock() = Some(signature);

        let sender = lane.identity.address();
        match fetch_balance(self.rpc(), &sender).await {
            Ok(snapshot) => lane.show(snapshot),
            Err(e) => tracing::warn!(%sender, error = %e, "balance refresh after transfer failed"),
        }
        Ok(signature)
    }

    /// Sign a message with the local keypair.
    pub async fn sign_message(&self, message: &str) -> Result<Signature, ActionError> {
        let _guard = self.enter(Action::SignMessage)?;
        let result = self.sign_locally(message);
        self.report(Action::SignMessage, result)
    }

    fn sign_locally(&self, message: &str) -> Result<Signature, ActionError> {
        let lane = self
            .current()
            .ok_or_else(|| ActionError::missing("Create a keypair first to sign a message"))?;
        let keypair = lane
            .identity
            .keypair()
            .ok_or_else(|| ActionError::missing("Message signing needs a local keypair"))?;
        signer::sign_message(keypair, message)
    }

    /// Re-read the current identity's balance. Never funds.
    pub async fn refresh_balance(&self) -> Result<BalanceSnapshot, ActionError> {
        let _guard = self.enter(Action::RefreshBalance)?;
        let result = self.read_balance().await;
        self.report(Action::RefreshBalance, result)
    }

    async fn read_balance(&self) -> Result<BalanceSnapshot, ActionError> {
        let lane = self
            .current()
            .ok_or_else(|| ActionError::missing("Create a keypair or connect a wallet first"))?;
        let _queue = lane.queue.lock().await;

        let snapshot =
            refresh_balance(self.rpc(), &lane.identity.address(), FundingPolicy::Never).await?;
        lane.show(snapshot);
        Ok(snapshot)
    }

    fn current(&self) -> Option<Arc<Lane>> {
        self.lane.read().clone()
    }

    /// Replace the identity with a fresh lane.
    fn install(&self, identity: Identity) -> Arc<Lane> {
        tracing::info!(?identity, "identity changed");
        let lane = Lane::new(identity);
        *self.lane.write() = Some(lane.clone());
        *self.last_transaction.lock() = None;
        lane
    }

    fn enter(&self, action: Action) -> Result<InFlight<'_>, ActionError> {
        match self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(InFlight(&self.in_flight)),
            Err(_) => self.report(action, Err(ActionError::Busy)),
        }
    }

    fn report<T>(&self, action: Action, result: Result<T, ActionError>) -> Result<T, ActionError> {
        match &result {
            Ok(_) => {
                if let Some(message) = action.success_message() {
                    self.notifier.notify(Notification::success(message));
                }
            }
            Err(err) => {
                tracing::error!(?action, error = %err, "action failed");
                let message = match err {
                    ActionError::MissingInput(reason) => reason.clone(),
                    ActionError::Busy => err.to_string(),
                    _ => action.failure_message().to_string(),
                };
                self.notifier.notify(Notification::error(message));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::identity::KeypairWallet;
    use crate::notify::{Level, MemoryNotifier};
    use solflow_core::LAMPORTS_PER_SOL;
    use solflow_rpc::LocalCluster;

    fn session() -> (Arc<LocalCluster>, Arc<MemoryNotifier>, Session) {
        let cluster = Arc::new(LocalCluster::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let session = Session::new(cluster.clone(), ClientConfig::default(), notifier.clone());
        (cluster, notifier, session)
    }

    #[tokio::test]
    async fn test_create_funded_identity() {
        let (cluster, notifier, session) = session();
        let address = session.create_funded_identity().await.unwrap();

        assert_eq!(session.identity_address(), Some(address));
        assert_eq!(session.balance().unwrap().display(), "1.000");
        assert_eq!(cluster.calls().request_airdrop, 1);
        assert_eq!(
            notifier.last(),
            Some(Notification::success("Keypair created and wallet funded successfully!"))
        );
    }

    #[tokio::test]
    async fn test_faucet_failure_keeps_identity() {
        let (cluster, notifier, session) = session();
        cluster.set_faucet_enabled(false);

        let err = session.create_funded_identity().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
        assert!(session.identity_address().is_some());
        assert_eq!(session.balance().unwrap().lamports, 0);
        assert_eq!(
            notifier.last(),
            Some(Notification::error("Failed to create and fund keypair"))
        );
    }

    #[tokio::test]
    async fn test_send_settles_and_refreshes() {
        let (cluster, _, session) = session();
        session.create_funded_identity().await.unwrap();
        let to = Keypair::generate().address();

        let sig = session
            .send(&TransferRequest::new(to.to_base58(), "0.5"))
            .await
            .unwrap();

        assert_eq!(session.last_outcome(), Some(SubmissionState::Settled(sig)));
        assert_eq!(session.state(), SubmissionState::Idle);
        assert_eq!(session.last_transaction(), Some(sig));
        assert!(session.explorer_link().unwrap().contains(&sig.to_base58()));
        assert_eq!(cluster.balance_of(&to), 500_000_000);
        // 0.5 SOL less the 5000 lamport fee.
        assert_eq!(session.balance().unwrap().lamports, 499_995_000);
        assert_eq!(session.balance().unwrap().display(), "0.500");
    }

    #[tokio::test]
    async fn test_send_without_identity() {
        let (cluster, notifier, session) = session();
        let err = session
            .send(&TransferRequest::new(Keypair::generate().address().to_base58(), "1"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingInput);
        assert!(matches!(session.last_outcome(), Some(SubmissionState::Failed(_))));
        assert_eq!(session.balance(), None);
        assert_eq!(cluster.calls().total(), 0);
        assert_eq!(notifier.last().unwrap().level, Level::Error);
    }

    #[tokio::test]
    async fn test_sign_message_requires_local_keypair() {
        let (_, _, session) = session();
        let err = session.sign_message("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingInput);

        let wallet = Arc::new(KeypairWallet::from_keypair(Keypair::generate()));
        session.connect_wallet(wallet).await.unwrap();
        let err = session.sign_message("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingInput);
    }

    #[tokio::test]
    async fn test_sign_message_verifies() {
        let (_, notifier, session) = session();
        let address = session.create_funded_identity().await.unwrap();

        let sig = session.sign_message("gm").await.unwrap();
        assert!(signer::verify_message(&address, "gm", &sig).is_ok());
        assert_eq!(
            notifier.last(),
            Some(Notification::success("Message signed successfully!"))
        );
    }

    #[tokio::test]
    async fn test_disconnect_clears_identity() {
        let (_, _, session) = session();
        let err = session.disconnect_wallet().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingInput);

        let wallet = Arc::new(KeypairWallet::from_keypair(Keypair::generate()));
        session.connect_wallet(wallet.clone()).await.unwrap();
        session.disconnect_wallet().await.unwrap();

        assert!(!wallet.connected());
        assert_eq!(session.identity_address(), None);
        assert_eq!(session.balance(), None);
    }

    #[tokio::test]
    async fn test_reconnect_same_wallet_keeps_lane() {
        let (cluster, _, session) = session();
        let wallet = Arc::new(KeypairWallet::from_keypair(Keypair::generate()));

        let address = session.connect_wallet(wallet.clone()).await.unwrap();
        cluster.set_balance(&address, 3 * LAMPORTS_PER_SOL);
        session.connect_wallet(wallet).await.unwrap();

        assert_eq!(session.balance().unwrap().display(), "3.000");
        assert_eq!(cluster.calls().request_airdrop, 1);
    }
}
