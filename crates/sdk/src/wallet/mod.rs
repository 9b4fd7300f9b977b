//! Wallet provider surface and the session built on top of it.

mod rpc;

use alloy::primitives::Address;
use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
pub use rpc::RpcWallet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{Deployment, error::WaveError, types};

/// Notification pushed by the wallet provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    /// Set of accounts exposed to the client changed, first one is active.
    AccountsChanged(Vec<Address>),
    /// Wallet switched to another chain.
    ChainChanged(u64),
}

/// Stream of wallet notifications, ends when the listener is cancelled.
pub type WalletEvents = BoxStream<'static, WalletEvent>;

/// Account access and notifications of an Ethereum wallet, mirroring the
/// EIP-1193 methods the portal relies on.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorized for this client (`eth_accounts`), never
    /// prompts the user.
    async fn accounts(&self) -> Result<Vec<Address>, WaveError>;

    /// Asks the user to authorize accounts (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<Address>, WaveError>;

    /// Chain the wallet is connected to (`eth_chainId`).
    async fn chain_id(&self) -> Result<u64, WaveError>;

    /// Registers a listener for `accountsChanged`/`chainChanged`.
    /// Dropping the stream unregisters it.
    fn events(&self) -> WalletEvents;
}

/// Outcome of an `accountsChanged` notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountChange {
    Connected(Address),
    Disconnected,
}

/// Tracks the active account and network correctness of a wallet.
///
/// Provider errors never leave the session: they are logged and reported
/// as "no account".
pub struct WalletSession<W> {
    provider: Option<W>,
    required_chain_id: u64,
    account: types::Account,
    chain_id: Option<u64>,
}

impl<W: WalletProvider> WalletSession<W> {
    /// `provider` is `None` when no wallet is available at all.
    pub fn new(provider: Option<W>, deployment: &Deployment) -> Self {
        Self { provider, required_chain_id: deployment.chain_id(), account: None, chain_id: None }
    }

    /// Forgets the account and chain, keeping the provider.
    pub fn reset(&mut self) {
        self.account = None;
        self.chain_id = None;
    }

    pub fn is_present(&self) -> bool { self.provider.is_some() }

    pub fn provider(&self) -> Option<&W> { self.provider.as_ref() }

    pub fn account(&self) -> types::Account { self.account }

    /// Last chain ID reported by the wallet.
    pub fn chain_id(&self) -> Option<u64> { self.chain_id }

    /// True iff the wallet is on the chain the contract is deployed to.
    pub fn network_correct(&self) -> bool { self.chain_id == Some(self.required_chain_id) }

    /// Picks up an account authorized earlier without prompting the user.
    pub async fn detect_authorized_account(&mut self) -> types::Account {
        let Some(provider) = &self.provider else {
            info!("no wallet provider, make sure a wallet is installed");
            return None;
        };

        self.account = match provider.accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(account) => {
                    info!(%account, "found an authorized account");
                    Some(*account)
                },
                None => {
                    info!("no authorized account found");
                    None
                },
            },
            Err(err) => {
                warn!("failed to read authorized accounts: {}", err);
                None
            },
        };
        self.account
    }

    /// Prompts the user to authorize an account.
    ///
    /// Fails only with [`WaveError::NoWallet`]; provider errors, including
    /// the user declining, are logged and yield `None`.
    pub async fn request_connection(&mut self) -> Result<types::Account, WaveError> {
        let provider = self.provider.as_ref().ok_or(WaveError::NoWallet)?;

        match provider.request_accounts().await {
            Ok(accounts) => {
                if let Some(account) = accounts.first() {
                    info!(%account, "connected to account");
                    self.account = Some(*account);
                    return Ok(self.account);
                }
                debug!("wallet granted no accounts");
                self.account = None;
                Ok(None)
            },
            Err(err) => {
                warn!("failed to connect wallet: {}", err);
                Ok(None)
            },
        }
    }

    /// Re-reads the chain ID, returns network correctness.
    pub async fn refresh_network(&mut self) -> bool {
        if let Some(provider) = &self.provider {
            match provider.chain_id().await {
                Ok(chain_id) => self.chain_id = Some(chain_id),
                Err(err) => {
                    warn!("failed to read chain ID: {}", err);
                    self.chain_id = None;
                },
            }
        }
        self.network_correct()
    }

    /// Applies an `accountsChanged` notification.
    pub fn accounts_changed(&mut self, accounts: &[Address]) -> AccountChange {
        match accounts.first() {
            Some(account) => {
                info!(%account, "switched to account");
                self.account = Some(*account);
                AccountChange::Connected(*account)
            },
            None => {
                info!("all accounts disconnected");
                self.account = None;
                AccountChange::Disconnected
            },
        }
    }

    /// Registers wallet listeners for the lifetime of `token`.
    pub fn listen(&self, token: CancellationToken) -> Option<WalletEvents> {
        self.provider
            .as_ref()
            .map(|provider| provider.events().take_until(token.cancelled_owned()).boxed())
    }
}
