use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::Address;
use async_trait::async_trait;
use futures::{
    StreamExt,
    channel::mpsc::{self, UnboundedSender},
};

use crate::{
    error::WaveError,
    wallet::{WalletEvent, WalletEvents, WalletProvider},
};

/// In-memory wallet provider.
///
/// Clones share state, so a test can keep a handle and drive
/// notifications while the session owns another.
#[derive(Clone, Debug)]
pub struct MockWallet {
    inner: Arc<Mutex<MockWalletState>>,
}

#[derive(Debug, Default)]
struct MockWalletState {
    chain_id: u64,
    authorized: Vec<Address>,
    grantable: Vec<Address>,
    failing: bool,
    prompts: usize,
    listeners: Vec<UnboundedSender<WalletEvent>>,
}

impl MockWallet {
    pub fn new(chain_id: u64) -> Self {
        Self { inner: Arc::new(Mutex::new(MockWalletState { chain_id, ..Default::default() })) }
    }

    /// Accounts authorized before the session starts.
    pub fn with_authorized(self, accounts: Vec<Address>) -> Self {
        self.state().authorized = accounts;
        self
    }

    /// Accounts the user grants when prompted.
    pub fn with_grantable(self, accounts: Vec<Address>) -> Self {
        self.state().grantable = accounts;
        self
    }

    /// Makes every request fail.
    pub fn fail_requests(&self, failing: bool) { self.state().failing = failing; }

    /// Number of authorization prompts shown so far.
    pub fn prompts(&self) -> usize { self.state().prompts }

    /// Number of registered listeners still alive.
    pub fn listeners(&self) -> usize {
        let mut state = self.state();
        state.listeners.retain(|tx| !tx.is_closed());
        state.listeners.len()
    }

    /// User switched or revoked accounts.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        let mut state = self.state();
        state.authorized = accounts.clone();
        state.notify(WalletEvent::AccountsChanged(accounts));
    }

    /// User switched the wallet to another chain.
    pub fn switch_chain(&self, chain_id: u64) {
        let mut state = self.state();
        state.chain_id = chain_id;
        state.notify(WalletEvent::ChainChanged(chain_id));
    }

    fn state(&self) -> MutexGuard<'_, MockWalletState> { self.inner.lock().unwrap() }

    fn check(&self) -> Result<MutexGuard<'_, MockWalletState>, WaveError> {
        let state = self.state();
        if state.failing {
            return Err(WaveError::InvalidRequest("wallet request failed".to_string()));
        }
        Ok(state)
    }
}

impl MockWalletState {
    fn notify(&mut self, event: WalletEvent) {
        self.listeners.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WaveError> {
        Ok(self.check()?.authorized.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WaveError> {
        let mut state = self.check()?;
        state.prompts += 1;
        if state.authorized.is_empty() {
            state.authorized = state.grantable.clone();
        }
        Ok(state.authorized.clone())
    }

    async fn chain_id(&self) -> Result<u64, WaveError> { Ok(self.check()?.chain_id) }

    fn events(&self) -> WalletEvents {
        let (tx, rx) = mpsc::unbounded();
        self.state().listeners.push(tx);
        rx.boxed()
    }
}
