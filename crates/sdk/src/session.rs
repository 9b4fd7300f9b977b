//! Session context owned by the UI root.
//!
//! A [`Session`] ties the wallet, the contract bindings, the feed and the
//! submission flow together for the lifetime of a view:
//!
//! * [`Session::mount`] detects the wallet account and network, opens the
//!   live `NewWave` subscription and loads the wave history.
//! * [`Session::next_update`] waits for the next wallet notification, live
//!   wave or confirmation settlement and applies it. A chain change reloads
//!   the whole session.
//! * [`Session::unmount`] (or dropping the session) cancels every listener
//!   and drops pending confirmation waits, so nothing fires against a
//!   torn-down view.
//!
//! Everything runs cooperatively on the caller's task.

use std::collections::VecDeque;

use alloy::primitives::{Address, TxHash};
use futures::{
    FutureExt, StreamExt,
    future::{self, BoxFuture},
    stream::FuturesUnordered,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    Deployment,
    contract::{self, Gateway, Subscription, WaveReader, WaveWriter},
    error::WaveError,
    feed::WaveFeed,
    submission::{Notice, SubmissionFlow},
    types::{self, WaveRecord},
    wallet::{AccountChange, WalletEvent, WalletEvents, WalletProvider, WalletSession},
};

type Settlement = BoxFuture<'static, (TxHash, Result<TxHash, WaveError>)>;

/// What the UI should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// No wallet provider, the portal cannot be used at all.
    NoWallet,
    /// Wallet present but no account connected.
    Connect,
    /// Account connected; `can_submit` is false while a wave is in flight.
    Compose { account: Address, can_submit: bool },
}

/// State change applied by [`Session::next_update`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    AccountChanged(types::Account),
    /// Wallet moved to another chain, the session was rebuilt from scratch.
    Reloaded { chain_id: u64 },
    /// Live wave added on top of the feed.
    NewWave(WaveRecord),
    /// Confirmation of a sent wave settled.
    Settled { tx_hash: TxHash, mined: bool },
}

/// Session context of the portal.
pub struct Session<W: WalletProvider, G: Gateway> {
    deployment: Deployment,
    wallet: WalletSession<W>,
    gateway: G,
    reader: Option<G::Reader>,
    feed: WaveFeed,
    submission: SubmissionFlow,
    message: String,
    notices: VecDeque<Notice>,
    lifetime: CancellationToken,
    wallet_events: Option<WalletEvents>,
    new_waves: Option<Subscription>,
    settlements: FuturesUnordered<Settlement>,
}

impl<W: WalletProvider, G: Gateway> Session<W, G> {
    /// Creates the session and runs initialization.
    ///
    /// `wallet` is `None` when no wallet provider is available. Failures
    /// during initialization are logged and leave the affected part empty.
    pub async fn mount(deployment: &Deployment, wallet: Option<W>, gateway: G) -> Self {
        let mut session = Self {
            deployment: deployment.clone(),
            wallet: WalletSession::new(wallet, deployment),
            gateway,
            reader: None,
            feed: WaveFeed::new(),
            submission: SubmissionFlow::new(),
            message: String::new(),
            notices: VecDeque::new(),
            lifetime: CancellationToken::new(),
            wallet_events: None,
            new_waves: None,
            settlements: FuturesUnordered::new(),
        };
        session.initialize().await;
        session
    }

    async fn initialize(&mut self) {
        self.wallet.detect_authorized_account().await;
        if !self.wallet.is_present() {
            return;
        }
        if !self.wallet.refresh_network().await {
            info!(
                chain_id = ?self.wallet.chain_id(),
                required = self.deployment.chain_id(),
                "wallet is on another network"
            );
        }
        self.wallet_events = self.wallet.listen(self.lifetime.child_token());

        let reader = match self.gateway.read_binding() {
            Ok(reader) => reader,
            Err(err) => {
                warn!("failed to bind contract: {}", err);
                return;
            },
        };

        // Subscribe before the bulk read so no wave falls in between
        match contract::subscribe_new_waves(&reader, self.lifetime.child_token()).await {
            Ok(subscription) => self.new_waves = Some(subscription),
            Err(err) => warn!("failed to subscribe to new waves: {}", err),
        }
        match reader.all_waves().await {
            Ok(history) => {
                debug!(count = history.len(), "loaded wave history");
                self.feed.initialize(history);
            },
            Err(err) => warn!("failed to load waves: {}", err),
        }
        self.reader = Some(reader);
    }

    /// Rebuilds the session from scratch, dropping all transient state.
    pub async fn reload(&mut self) {
        self.teardown();
        self.wallet.reset();
        self.feed = WaveFeed::new();
        self.submission.reset();
        self.message.clear();
        self.notices.clear();
        self.initialize().await;
    }

    /// Cancels listeners and subscriptions and drops pending confirmation
    /// waits.
    pub fn unmount(mut self) { self.teardown() }

    fn teardown(&mut self) {
        self.lifetime.cancel();
        self.lifetime = CancellationToken::new();
        self.wallet_events = None;
        if let Some(subscription) = self.new_waves.take() {
            contract::unsubscribe(subscription);
        }
        self.reader = None;
        self.settlements = FuturesUnordered::new();
    }

    pub fn deployment(&self) -> &Deployment { &self.deployment }

    pub fn account(&self) -> types::Account { self.wallet.account() }

    pub fn network_correct(&self) -> bool { self.wallet.network_correct() }

    pub fn feed(&self) -> &WaveFeed { &self.feed }

    pub fn submission(&self) -> &SubmissionFlow { &self.submission }

    pub fn view(&self) -> View {
        if !self.wallet.is_present() {
            return View::NoWallet;
        }
        match self.wallet.account() {
            Some(account) => View::Compose { account, can_submit: self.submission.can_submit() },
            None => View::Connect,
        }
    }

    /// Message typed so far.
    pub fn message(&self) -> &str { &self.message }

    pub fn set_message(&mut self, message: impl Into<String>) { self.message = message.into(); }

    /// Notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> { self.notices.drain(..).collect() }

    /// Asks the wallet to authorize an account.
    pub async fn connect(&mut self) -> types::Account {
        match self.wallet.request_connection().await {
            Ok(account) => account,
            Err(err) => {
                warn!("{}", err);
                self.notices.push_back(Notice::NoWallet);
                None
            },
        }
    }

    /// Sends the pending message as a wave.
    ///
    /// Guards are checked before any contract call. On success the
    /// transaction is sent but not mined yet: its settlement is reported by
    /// [`Self::next_update`].
    pub async fn submit(&mut self) -> Result<TxHash, WaveError> {
        if let Err(rejection) =
            self.submission.begin(&self.message, self.wallet.network_correct())
        {
            self.notices.push_back(Notice::Rejected(rejection));
            return Err(rejection.into());
        }

        match self.send().await {
            Ok(tx_hash) => {
                self.notices.push_back(self.submission.sent(tx_hash));
                self.message.clear();
                self.log_total_waves().await;
                Ok(tx_hash)
            },
            Err(err) => {
                warn!("failed to send wave: {}", err);
                self.submission.send_failed();
                Err(err)
            },
        }
    }

    async fn send(&mut self) -> Result<TxHash, WaveError> {
        let account = self.wallet.account().ok_or(WaveError::NotConnected)?;
        let writer = self.gateway.sign_binding(account)?;

        self.log_total_waves().await;

        let pending = writer.wave(&self.message).await?;
        let tx_hash = pending.tx_hash();
        info!(%tx_hash, "mining");

        let confirmation = pending.confirmation();
        self.settlements.push(confirmation.map(move |result| (tx_hash, result)).boxed());
        Ok(tx_hash)
    }

    /// Wave count reported by the contract.
    pub async fn total_waves(&self) -> Result<u64, WaveError> {
        let reader = self
            .reader
            .as_ref()
            .ok_or_else(|| WaveError::InvalidRequest("contract is not bound".to_string()))?;
        reader.total_waves().await
    }

    async fn log_total_waves(&self) {
        if self.reader.is_none() {
            return;
        }
        match self.total_waves().await {
            Ok(total) => info!(total, "retrieved total wave count"),
            Err(err) => warn!("failed to read total waves: {}", err),
        }
    }

    /// Waits for the next wallet notification, live wave or settlement and
    /// applies it.
    ///
    /// Returns `None` once nothing can produce updates anymore.
    pub async fn next_update(&mut self) -> Option<Update> {
        loop {
            let event = {
                let Self { wallet_events, new_waves, settlements, .. } = self;
                if wallet_events.is_none() && new_waves.is_none() && settlements.is_empty() {
                    return None;
                }

                let wallet_next = async {
                    match wallet_events.as_mut() {
                        Some(events) => events.next().await,
                        None => future::pending().await,
                    }
                };
                let wave_next = async {
                    match new_waves.as_mut() {
                        Some(subscription) => subscription.next().await,
                        None => future::pending().await,
                    }
                };
                let settlement_next = async {
                    if settlements.is_empty() {
                        future::pending::<()>().await;
                    }
                    settlements.next().await
                };

                tokio::select! {
                    biased;
                    settlement = settlement_next => Next::Settlement(settlement),
                    event = wallet_next => Next::Wallet(event),
                    wave = wave_next => Next::Wave(wave),
                }
            };

            let update = match event {
                Next::Settlement(Some((tx_hash, result))) => Some(self.settle(tx_hash, result)),
                Next::Settlement(None) => None,
                Next::Wallet(Some(event)) => self.apply_wallet_event(event).await,
                Next::Wallet(None) => {
                    debug!("wallet listener closed");
                    self.wallet_events = None;
                    None
                },
                Next::Wave(Some(Ok(record))) => {
                    if self.feed.append(record.clone()) {
                        Some(Update::NewWave(record))
                    } else {
                        debug!(?record, "wave already in feed");
                        None
                    }
                },
                Next::Wave(Some(Err(err))) => {
                    warn!("failed to receive new waves: {}", err);
                    None
                },
                Next::Wave(None) => {
                    debug!("new wave subscription closed");
                    self.new_waves = None;
                    None
                },
            };
            if update.is_some() {
                return update;
            }
        }
    }

    fn settle(&mut self, tx_hash: TxHash, result: Result<TxHash, WaveError>) -> Update {
        let mined = match result {
            Ok(_) => {
                info!(%tx_hash, "mined");
                true
            },
            Err(err) => {
                warn!(%tx_hash, "wave failed: {}", err);
                false
            },
        };
        self.notices.push_back(self.submission.settled(tx_hash, mined));
        Update::Settled { tx_hash, mined }
    }

    async fn apply_wallet_event(&mut self, event: WalletEvent) -> Option<Update> {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                if self.wallet.accounts_changed(&accounts) == AccountChange::Disconnected {
                    self.notices.push_back(Notice::NoAuthorizedAccount);
                }
                Some(Update::AccountChanged(self.wallet.account()))
            },
            WalletEvent::ChainChanged(chain_id) => {
                info!(chain_id, "chain changed, reloading");
                self.reload().await;
                Some(Update::Reloaded { chain_id })
            },
        }
    }
}

impl<W: WalletProvider, G: Gateway> Drop for Session<W, G> {
    fn drop(&mut self) { self.lifetime.cancel(); }
}

enum Next {
    Settlement(Option<(TxHash, Result<TxHash, WaveError>)>),
    Wallet(Option<WalletEvent>),
    Wave(Option<Result<WaveRecord, WaveError>>),
}
