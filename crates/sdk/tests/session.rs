use std::time::Duration;

use alloy::primitives::{Address, address};
use wave_portal_sdk::{
    Deployment,
    error::WaveError,
    session::{Session, Update, View},
    submission::{Notice, Rejection},
    testing::{MockContract, MockWallet},
    types::WaveRecord,
};

const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
const A: Address = address!("0x000000000000000000000000000000000000000a");
const B: Address = address!("0x000000000000000000000000000000000000000b");

fn deployment() -> Deployment {
    Deployment::custom(4, address!("0x27dc3c63364A49dE5cfAA374b786Ad1f10d447e2"), "https://explorer.test")
}

async fn next(session: &mut Session<MockWallet, MockContract>) -> Update {
    tokio::time::timeout(Duration::from_secs(1), session.next_update())
        .await
        .expect("no update in time")
        .expect("session has no update sources")
}

async fn mount(
    wallet: &MockWallet,
    contract: &MockContract,
) -> Session<MockWallet, MockContract> {
    Session::mount(&deployment(), Some(wallet.clone()), contract.clone()).await
}

/// Bulk history followed by a live wave, shown most recent first.
#[tokio::test]
async fn test_history_then_live_wave() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new().with_history(vec![WaveRecord::new(A, "hi", 1000)]);
    let mut session = mount(&wallet, &contract).await;

    assert_eq!(session.feed().len(), 1);
    assert_eq!(session.view(), View::Compose { account: ALICE, can_submit: true });

    contract.emit(WaveRecord::new(B, "yo", 2000));
    assert_eq!(next(&mut session).await, Update::NewWave(WaveRecord::new(B, "yo", 2000)));

    let latest: Vec<_> = session.feed().latest_first().map(|w| (w.address, w.message.as_str())).collect();
    assert_eq!(latest, vec![(B, "yo"), (A, "hi")]);

    let view = session.feed().view(session.deployment().explorer(), 2000);
    let cards: Vec<_> = view.cards().collect();
    assert_eq!(cards[0].record().message, "yo");
    assert_eq!(cards[1].record().address, A);
    assert_eq!(cards[1].time(), "17 minutes ago");
}

#[tokio::test]
async fn test_bulk_read_is_reversed() {
    let history: Vec<_> = (0..5u64).map(|i| WaveRecord::new(A, format!("#{i}"), 1000 + i)).collect();
    let contract = MockContract::new().with_history(history.clone());
    let session = mount(&MockWallet::new(4), &contract).await;

    assert_eq!(session.feed().len(), history.len());
    let shown: Vec<_> = session.feed().latest_first().cloned().collect();
    let expected: Vec<_> = history.into_iter().rev().collect();
    assert_eq!(shown, expected);
}

#[tokio::test]
async fn test_live_duplicate_of_history_is_dropped() {
    let contract = MockContract::new().with_history(vec![WaveRecord::new(A, "hi", 1000)]);
    let mut session = mount(&MockWallet::new(4), &contract).await;

    contract.emit(WaveRecord::new(A, "hi", 1000));
    contract.emit(WaveRecord::new(B, "yo", 2000));

    assert_eq!(next(&mut session).await, Update::NewWave(WaveRecord::new(B, "yo", 2000)));
    assert_eq!(session.feed().len(), 2);
}

#[tokio::test]
async fn test_empty_message_never_reaches_contract() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new();
    let mut session = mount(&wallet, &contract).await;

    for message in ["", "   ", "\n\t"] {
        session.set_message(message);
        let result = session.submit().await;
        assert!(matches!(result, Err(WaveError::Rejected(Rejection::EmptyMessage))));
    }

    assert_eq!(session.take_notices(), vec![Notice::Rejected(Rejection::EmptyMessage); 3]);
    assert_eq!(contract.calls().sign_bindings, 0);
    assert_eq!(contract.calls().waves_sent, 0);
}

#[tokio::test]
async fn test_wrong_network_never_reaches_contract() {
    let wallet = MockWallet::new(1).with_authorized(vec![ALICE]);
    let contract = MockContract::new();
    let mut session = mount(&wallet, &contract).await;
    assert!(!session.network_correct());

    session.set_message("hello");
    let result = session.submit().await;

    assert!(matches!(result, Err(WaveError::Rejected(Rejection::WrongNetwork))));
    assert_eq!(session.take_notices(), vec![Notice::Rejected(Rejection::WrongNetwork)]);
    assert_eq!(contract.calls().waves_sent, 0);
    // Rejection keeps the message for another try
    assert_eq!(session.message(), "hello");
}

/// Submission stays in flight until the confirmation settles.
#[tokio::test]
async fn test_submission_lifecycle() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new().with_history(vec![WaveRecord::new(A, "hi", 1000)]);
    let mut session = mount(&wallet, &contract).await;

    session.set_message("hello");
    let tx_hash = session.submit().await.unwrap();

    assert_eq!(session.take_notices(), vec![Notice::Pending(tx_hash)]);
    assert_eq!(session.view(), View::Compose { account: ALICE, can_submit: false });
    assert_eq!(session.message(), "");
    assert_eq!(contract.calls().total_waves, 2);

    session.set_message("again");
    assert!(matches!(session.submit().await, Err(WaveError::Rejected(Rejection::InFlight))));
    assert_eq!(contract.calls().waves_sent, 1);
    session.take_notices();

    assert_eq!(contract.confirm_next(true), Some(tx_hash));
    let updates = vec![next(&mut session).await, next(&mut session).await];

    assert!(updates.contains(&Update::Settled { tx_hash, mined: true }));
    assert!(updates.iter().any(
        |u| matches!(u, Update::NewWave(record) if record.address == ALICE && record.message == "hello")
    ));
    assert_eq!(session.take_notices(), vec![Notice::Mined(tx_hash)]);
    assert_eq!(session.view(), View::Compose { account: ALICE, can_submit: true });
    assert_eq!(session.feed().latest_first().next().unwrap().message, "hello");
}

#[tokio::test]
async fn test_failed_confirmation() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new();
    let mut session = mount(&wallet, &contract).await;

    session.set_message("hello");
    let tx_hash = session.submit().await.unwrap();
    session.take_notices();

    contract.confirm_next(false);
    assert_eq!(next(&mut session).await, Update::Settled { tx_hash, mined: false });

    let notices = session.take_notices();
    assert_eq!(notices, vec![Notice::Failed(tx_hash)]);
    assert_eq!(notices[0].to_string(), "Please wait 5 min and try again");
    assert!(session.submission().can_submit());
    assert!(session.feed().is_empty());
}

#[tokio::test]
async fn test_rejected_signature_returns_to_idle() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new();
    contract.reject_sends(true);
    let mut session = mount(&wallet, &contract).await;

    session.set_message("hello");
    assert!(matches!(session.submit().await, Err(WaveError::InvalidRequest(_))));

    assert!(session.take_notices().is_empty());
    assert!(session.submission().can_submit());
    assert_eq!(contract.pending(), 0);
}

#[tokio::test]
async fn test_disconnecting_all_accounts() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new();
    let mut session = mount(&wallet, &contract).await;
    assert_eq!(session.account(), Some(ALICE));

    wallet.set_accounts(vec![]);
    assert_eq!(next(&mut session).await, Update::AccountChanged(None));

    assert_eq!(session.account(), None);
    assert_eq!(session.view(), View::Connect);
    assert_eq!(session.take_notices(), vec![Notice::NoAuthorizedAccount]);

    wallet.set_accounts(vec![B, ALICE]);
    assert_eq!(next(&mut session).await, Update::AccountChanged(Some(B)));
}

/// Chain change reruns initialization instead of patching state.
#[tokio::test]
async fn test_chain_change_reloads() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new().with_history(vec![WaveRecord::new(A, "hi", 1000)]);
    let mut session = mount(&wallet, &contract).await;

    assert_eq!(contract.calls().read_bindings, 1);
    assert_eq!(contract.calls().all_waves, 1);

    wallet.switch_chain(1);
    assert_eq!(next(&mut session).await, Update::Reloaded { chain_id: 1 });

    assert_eq!(contract.calls().read_bindings, 2);
    assert_eq!(contract.calls().all_waves, 2);
    assert_eq!(session.feed().len(), 1);
    assert!(!session.network_correct());
    // Old listeners and subscription were replaced, not duplicated
    assert_eq!(wallet.listeners(), 1);
    assert_eq!(contract.subscribers(), 1);

    contract.emit(WaveRecord::new(B, "yo", 2000));
    assert_eq!(next(&mut session).await, Update::NewWave(WaveRecord::new(B, "yo", 2000)));
    assert_eq!(session.feed().len(), 2);
}

/// Reload derives the account again; a wallet that stops answering leaves
/// none behind.
#[tokio::test]
async fn test_chain_change_drops_unconfirmed_account() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new();
    let mut session = mount(&wallet, &contract).await;
    assert_eq!(session.account(), Some(ALICE));

    wallet.fail_requests(true);
    wallet.switch_chain(1);
    assert_eq!(next(&mut session).await, Update::Reloaded { chain_id: 1 });

    assert_eq!(session.account(), None);
    assert_eq!(session.view(), View::Connect);
    assert!(!session.network_correct());
}

#[tokio::test]
async fn test_connect_flow() {
    let wallet = MockWallet::new(4).with_grantable(vec![ALICE]);
    let contract = MockContract::new();
    let mut session = mount(&wallet, &contract).await;

    assert_eq!(session.view(), View::Connect);
    assert_eq!(wallet.prompts(), 0);

    assert_eq!(session.connect().await, Some(ALICE));
    assert_eq!(session.view(), View::Compose { account: ALICE, can_submit: true });
}

#[tokio::test]
async fn test_without_wallet() {
    let contract = MockContract::new().with_history(vec![WaveRecord::new(A, "hi", 1000)]);
    let mut session =
        Session::<MockWallet, _>::mount(&deployment(), None, contract.clone()).await;

    assert_eq!(session.view(), View::NoWallet);
    assert_eq!(session.connect().await, None);

    let notices = session.take_notices();
    assert_eq!(notices, vec![Notice::NoWallet]);
    assert!(notices[0].is_blocking());
    assert_eq!(contract.calls().read_bindings, 0);
    assert!(session.next_update().await.is_none());
}

#[tokio::test]
async fn test_total_waves_reads_contract() {
    let history: Vec<_> = (0..3u64).map(|i| WaveRecord::new(A, format!("#{i}"), 1000 + i)).collect();
    let contract = MockContract::new().with_history(history);
    let session = mount(&MockWallet::new(4), &contract).await;

    assert_eq!(session.total_waves().await.unwrap(), 3);
    assert_eq!(contract.calls().total_waves, 1);

    let detached =
        Session::<MockWallet, _>::mount(&deployment(), None, MockContract::new()).await;
    assert!(matches!(detached.total_waves().await, Err(WaveError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_read_failure_keeps_feed_empty() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new().with_history(vec![WaveRecord::new(A, "hi", 1000)]);
    contract.fail_reads(true);
    let session = mount(&wallet, &contract).await;

    assert!(session.feed().is_empty());
    assert!(!session.feed().is_initialized());
    assert_eq!(session.view(), View::Compose { account: ALICE, can_submit: true });
}

#[tokio::test]
async fn test_unmount_releases_listeners() {
    let wallet = MockWallet::new(4).with_authorized(vec![ALICE]);
    let contract = MockContract::new();
    let mut session = mount(&wallet, &contract).await;

    session.set_message("hello");
    session.submit().await.unwrap();

    assert_eq!(wallet.listeners(), 1);
    assert_eq!(contract.subscribers(), 1);

    session.unmount();

    assert_eq!(wallet.listeners(), 0);
    assert_eq!(contract.subscribers(), 0);
    // Settling after teardown reaches nobody
    assert!(contract.confirm_next(true).is_some());
}
