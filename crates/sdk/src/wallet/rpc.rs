use std::{borrow::Cow, time::Duration};

use alloy::{primitives::Address, providers::Provider, transports::TransportError};
use async_trait::async_trait;
use futures::{Stream, StreamExt, stream};
use tracing::debug;

use super::{WalletEvent, WalletEvents, WalletProvider};
use crate::error::WaveError;

const METHOD_NOT_FOUND: i64 = -32601;

/// Wallet backed by a JSON-RPC node.
///
/// Accounts are either the ones the node manages (`eth_accounts`) or a
/// single local account whose key is held by the provider's wallet filler.
/// Notifications are produced by polling the node with the provider's poll
/// interval.
#[derive(Clone, Debug)]
pub struct RpcWallet<P> {
    provider: P,
    local_account: Option<Address>,
    poll_interval: Duration,
}

impl<P: Provider + Clone + 'static> RpcWallet<P> {
    pub fn new(provider: P) -> Self {
        let poll_interval = provider.client().poll_interval();
        Self { provider, local_account: None, poll_interval }
    }

    /// Wallet exposing only `account`, signed for by the provider.
    pub fn with_local_account(provider: P, account: Address) -> Self {
        Self { local_account: Some(account), ..Self::new(provider) }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn provider(&self) -> &P { &self.provider }
}

#[async_trait]
impl<P: Provider + Clone + 'static> WalletProvider for RpcWallet<P> {
    async fn accounts(&self) -> Result<Vec<Address>, WaveError> {
        if let Some(account) = self.local_account {
            return Ok(vec![account]);
        }
        Ok(self.provider.get_accounts().await?)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WaveError> {
        if let Some(account) = self.local_account {
            return Ok(vec![account]);
        }
        match self
            .provider
            .raw_request::<_, Vec<Address>>(Cow::Borrowed("eth_requestAccounts"), ())
            .await
        {
            Ok(accounts) => Ok(accounts),
            // Plain nodes grant their accounts without a prompt
            Err(err) if is_method_not_found(&err) => {
                debug!("eth_requestAccounts not supported, using eth_accounts");
                Ok(self.provider.get_accounts().await?)
            },
            Err(err) => Err(err.into()),
        }
    }

    async fn chain_id(&self) -> Result<u64, WaveError> { Ok(self.provider.get_chain_id().await?) }

    fn events(&self) -> WalletEvents {
        watch(self.provider.clone(), self.local_account, self.poll_interval).boxed()
    }
}

fn is_method_not_found(err: &TransportError) -> bool {
    err.as_error_resp().is_some_and(|payload| payload.code == METHOD_NOT_FOUND)
}

/// Polls accounts and chain ID, emitting an event on every change.
///
/// The first poll only establishes the baseline.
fn watch<P: Provider + 'static>(
    provider: P,
    local_account: Option<Address>,
    poll_interval: Duration,
) -> impl Stream<Item = WalletEvent> + Send + 'static {
    stream::unfold(
        (provider, None::<Vec<Address>>, None::<u64>),
        move |(provider, mut accounts, mut chain_id)| async move {
            loop {
                let mut events = Vec::new();

                if local_account.is_none() {
                    match provider.get_accounts().await {
                        Ok(current) => {
                            if let Some(previous) = &accounts
                                && *previous != current
                            {
                                events.push(WalletEvent::AccountsChanged(current.clone()));
                            }
                            accounts = Some(current);
                        },
                        Err(err) => debug!("failed to poll accounts: {}", err),
                    }
                }

                match provider.get_chain_id().await {
                    Ok(current) => {
                        if chain_id.is_some_and(|previous| previous != current) {
                            events.push(WalletEvent::ChainChanged(current));
                        }
                        chain_id = Some(current);
                    },
                    Err(err) => debug!("failed to poll chain ID: {}", err),
                }

                if !events.is_empty() {
                    return Some((stream::iter(events), (provider, accounts, chain_id)));
                }
                tokio::time::sleep(poll_interval).await;
            }
        },
    )
    .flatten()
}
