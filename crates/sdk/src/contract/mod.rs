//! Bindings to the `WavePortal` contract.
//!
//! [`Gateway`] builds a read-only [`WaveReader`] for queries and a
//! [`WaveWriter`] signing for the connected account. Both have to be rebuilt
//! whenever the underlying wallet provider changes.

mod binding;

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
pub use binding::{AlloyGateway, ReadBinding, SignBinding};
use futures::{Stream, StreamExt, future::BoxFuture, stream::BoxStream};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{error::WaveError, types::WaveRecord};

/// Stream of waves announced by `NewWave` events, in receipt order.
pub type WaveStream = BoxStream<'static, Result<WaveRecord, WaveError>>;

/// Read-only contract calls.
#[async_trait]
pub trait WaveReader: Send + Sync {
    /// Number of waves stored by the contract.
    async fn total_waves(&self) -> Result<u64, WaveError>;

    /// Complete wave history, oldest first.
    async fn all_waves(&self) -> Result<Vec<WaveRecord>, WaveError>;

    /// Waves announced from now on.
    async fn new_waves(&self) -> Result<WaveStream, WaveError>;
}

/// State-changing contract calls.
#[async_trait]
pub trait WaveWriter: Send + Sync {
    /// Sends a `wave` transaction, returns as soon as the transaction is
    /// accepted by the network.
    async fn wave(&self, message: &str) -> Result<PendingWave, WaveError>;
}

/// Factory of contract bindings.
pub trait Gateway: Send + Sync {
    type Reader: WaveReader;
    type Writer: WaveWriter;

    fn read_binding(&self) -> Result<Self::Reader, WaveError>;

    /// Binding signing on behalf of `signer`.
    fn sign_binding(&self, signer: Address) -> Result<Self::Writer, WaveError>;
}

/// Sent `wave` transaction waiting to be mined.
pub struct PendingWave {
    tx_hash: TxHash,
    confirmation: BoxFuture<'static, Result<TxHash, WaveError>>,
}

impl PendingWave {
    pub fn new(
        tx_hash: TxHash,
        confirmation: BoxFuture<'static, Result<TxHash, WaveError>>,
    ) -> Self {
        Self { tx_hash, confirmation }
    }

    pub fn tx_hash(&self) -> TxHash { self.tx_hash }

    /// Resolves once the transaction is mined successfully, fails if it
    /// reverted or was dropped.
    pub fn confirmation(self) -> BoxFuture<'static, Result<TxHash, WaveError>> {
        self.confirmation
    }
}

impl std::fmt::Debug for PendingWave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWave").field("tx_hash", &self.tx_hash).finish_non_exhaustive()
    }
}

/// Live `NewWave` subscription.
///
/// Ends when its token is cancelled; dropping the handle cancels the token.
pub struct Subscription {
    stream: WaveStream,
    _guard: DropGuard,
}

impl Subscription {
    pub fn new(stream: WaveStream, token: CancellationToken) -> Self {
        Self {
            stream: stream.take_until(token.clone().cancelled_owned()).boxed(),
            _guard: token.drop_guard(),
        }
    }
}

impl Stream for Subscription {
    type Item = Result<WaveRecord, WaveError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.poll_next_unpin(cx)
    }
}

/// Opens the live `NewWave` subscription of `reader` for the lifetime of
/// `token`.
pub async fn subscribe_new_waves<R: WaveReader + ?Sized>(
    reader: &R,
    token: CancellationToken,
) -> Result<Subscription, WaveError> {
    Ok(Subscription::new(reader.new_waves().await?, token))
}

/// Closes a subscription opened by [`subscribe_new_waves`].
pub fn unsubscribe(subscription: Subscription) { drop(subscription) }
