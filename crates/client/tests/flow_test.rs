use solflow_client::{
    ClientConfig, ErrorKind, KeypairWallet, Level, MemoryNotifier, Notification, Session,
    SubmissionState, TransferRequest,
};
use solflow_core::{Keypair, LAMPORTS_PER_SOL};
use solflow_rpc::LocalCluster;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    cluster: Arc<LocalCluster>,
    notifier: Arc<MemoryNotifier>,
    session: Session,
}

fn harness() -> Harness {
    let cluster = Arc::new(LocalCluster::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let session = Session::new(cluster.clone(), ClientConfig::default(), notifier.clone());
    Harness {
        cluster,
        notifier,
        session,
    }
}

fn new_address() -> String {
    Keypair::generate().address().to_base58()
}

#[tokio::test]
async fn test_generate_shows_one_sol() {
    let h = harness();
    h.session.create_funded_identity().await.unwrap();

    let balance = h.session.balance().unwrap();
    assert_eq!(balance.display(), "1.000");
    assert_eq!(balance.to_string(), "1.000 SOL");
}

#[tokio::test]
async fn test_generate_then_send_half() {
    let h = harness();
    h.session.create_funded_identity().await.unwrap();

    let id = h
        .session
        .send(&TransferRequest::new(new_address(), "0.5"))
        .await
        .unwrap();

    assert!(!id.to_base58().is_empty());
    assert_eq!(h.session.last_outcome(), Some(SubmissionState::Settled(id)));
    assert_eq!(
        h.notifier.last(),
        Some(Notification::success("Sol sent successfully!"))
    );
}

#[tokio::test]
async fn test_send_without_identity_leaves_balance() {
    let h = harness();
    let err = h
        .session
        .send(&TransferRequest::new(new_address(), "1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingInput);
    assert_eq!(h.session.balance(), None);
    assert_eq!(h.cluster.calls().total(), 0);
}

#[tokio::test]
async fn test_empty_fields_notify_reason() {
    let h = harness();
    h.session.create_funded_identity().await.unwrap();
    let before = h.cluster.calls();

    let err = h
        .session
        .send(&TransferRequest::new("", ""))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingInput);
    assert_eq!(h.cluster.calls(), before);
    assert_eq!(
        h.notifier.last(),
        Some(Notification::error("Fill in all fields"))
    );
}

#[tokio::test]
async fn test_network_failure_is_generic() {
    let h = harness();
    h.session.create_funded_identity().await.unwrap();
    h.cluster.set_offline(true);

    let err = h
        .session
        .send(&TransferRequest::new(new_address(), "0.1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    assert_eq!(
        h.notifier.last(),
        Some(Notification::error("Failed to transfer sol"))
    );
    assert!(matches!(
        h.session.last_outcome(),
        Some(SubmissionState::Failed(_))
    ));
    assert_eq!(h.session.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_empty_wallet_funded_once() {
    let h = harness();
    let wallet = Arc::new(KeypairWallet::from_keypair(Keypair::generate()));

    h.session.connect_wallet(wallet).await.unwrap();

    assert_eq!(h.cluster.calls().request_airdrop, 1);
    assert_eq!(h.session.balance().unwrap().display(), "1.000");
}

#[tokio::test]
async fn test_funded_wallet_not_airdropped() {
    let h = harness();
    let keypair = Keypair::generate();
    h.cluster.set_balance(&keypair.address(), 1_500_000_000);
    let wallet = Arc::new(KeypairWallet::from_keypair(keypair));

    h.session.connect_wallet(wallet).await.unwrap();

    assert_eq!(h.cluster.calls().request_airdrop, 0);
    assert_eq!(h.session.balance().unwrap().display(), "1.500");
}

#[tokio::test]
async fn test_wallet_send() {
    let h = harness();
    let keypair = Keypair::generate();
    h.cluster.set_balance(&keypair.address(), 2 * LAMPORTS_PER_SOL);
    let wallet = Arc::new(KeypairWallet::from_keypair(keypair));
    h.session.connect_wallet(wallet).await.unwrap();

    let to = Keypair::generate().address();
    h.session
        .send(&TransferRequest::new(to.to_base58(), "1.25"))
        .await
        .unwrap();

    assert_eq!(h.cluster.balance_of(&to), 1_250_000_000);
    assert_eq!(h.session.balance().unwrap().display(), "0.750");
}

#[tokio::test]
async fn test_second_action_is_busy() {
    let h = harness();
    h.cluster.set_latency(Duration::from_millis(50));

    let (first, second) = tokio::join!(h.session.create_funded_identity(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.session.create_funded_identity().await
    });

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err().kind(), ErrorKind::Busy);
    assert!(!h.session.is_busy());
    assert_eq!(h.cluster.calls().request_airdrop, 1);
    assert!(h
        .notifier
        .all()
        .iter()
        .any(|n| n.level == Level::Error && n.message.contains("in progress")));
}

#[tokio::test]
async fn test_state_observed_while_submitting() {
    let h = harness();
    h.session.create_funded_identity().await.unwrap();
    h.cluster.set_latency(Duration::from_millis(20));

    let mut rx = h.session.subscribe();
    let watcher = async move {
        rx.changed().await.unwrap();
        let seen = rx.borrow().clone();
        seen
    };
    let request = TransferRequest::new(new_address(), "0.1");
    let (seen, result) = tokio::join!(watcher, h.session.send(&request));

    assert_eq!(seen, SubmissionState::Submitting);
    assert!(result.is_ok());
}
