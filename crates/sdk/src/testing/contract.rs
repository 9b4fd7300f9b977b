use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use futures::{
    FutureExt, StreamExt,
    channel::{
        mpsc::{self, UnboundedSender},
        oneshot,
    },
};

use crate::{
    contract::{Gateway, PendingWave, WaveReader, WaveStream, WaveWriter},
    error::WaveError,
    types::WaveRecord,
};

/// In-memory `WavePortal` contract.
///
/// Sent waves stay pending until [`MockContract::confirm_next`] mines them,
/// which also emits `NewWave` to every live subscription. Clones share
/// state.
#[derive(Clone, Debug, Default)]
pub struct MockContract {
    inner: Arc<Mutex<MockContractState>>,
}

#[derive(Debug, Default)]
struct MockContractState {
    waves: Vec<WaveRecord>,
    now: u64,
    failing_reads: bool,
    rejecting_sends: bool,
    next_tx: u64,
    pending: VecDeque<PendingSend>,
    subscribers: Vec<UnboundedSender<Result<WaveRecord, WaveError>>>,
    calls: CallCounts,
}

#[derive(Debug)]
struct PendingSend {
    tx_hash: TxHash,
    from: Address,
    message: String,
    settle: oneshot::Sender<Result<TxHash, WaveError>>,
}

/// Number of calls the contract has seen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub read_bindings: usize,
    pub sign_bindings: usize,
    pub total_waves: usize,
    pub all_waves: usize,
    pub subscriptions: usize,
    pub waves_sent: usize,
}

impl MockContract {
    pub fn new() -> Self { Self::default() }

    /// Wave history already on chain.
    pub fn with_history(self, waves: Vec<WaveRecord>) -> Self {
        {
            let mut state = self.state();
            state.now = waves.iter().map(|w| w.timestamp).max().unwrap_or_default();
            state.waves = waves;
        }
        self
    }

    pub fn fail_reads(&self, failing: bool) { self.state().failing_reads = failing; }

    /// Makes the wallet refuse to sign.
    pub fn reject_sends(&self, rejecting: bool) { self.state().rejecting_sends = rejecting; }

    pub fn calls(&self) -> CallCounts { self.state().calls }

    /// Number of sent waves not settled yet.
    pub fn pending(&self) -> usize { self.state().pending.len() }

    /// Number of subscriptions still alive.
    pub fn subscribers(&self) -> usize {
        let mut state = self.state();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }

    /// Emits `NewWave` as if someone else waved.
    pub fn emit(&self, record: WaveRecord) {
        let mut state = self.state();
        state.now = state.now.max(record.timestamp);
        state.waves.push(record.clone());
        state.subscribers.retain(|tx| tx.unbounded_send(Ok(record.clone())).is_ok());
    }

    /// Settles the oldest pending wave, mining it when `mined`.
    pub fn confirm_next(&self, mined: bool) -> Option<TxHash> {
        let pending = self.state().pending.pop_front()?;
        let tx_hash = pending.tx_hash;
        if mined {
            let timestamp = self.state().now + 1;
            self.emit(WaveRecord::new(pending.from, pending.message, timestamp));
            let _ = pending.settle.send(Ok(tx_hash));
        } else {
            let _ = pending.settle.send(Err(WaveError::Reverted(tx_hash)));
        }
        Some(tx_hash)
    }

    fn state(&self) -> MutexGuard<'_, MockContractState> { self.inner.lock().unwrap() }

    fn read(&self) -> Result<MutexGuard<'_, MockContractState>, WaveError> {
        let state = self.state();
        if state.failing_reads {
            return Err(WaveError::InvalidRequest("contract read failed".to_string()));
        }
        Ok(state)
    }
}

impl Gateway for MockContract {
    type Reader = MockContract;
    type Writer = MockSigner;

    fn read_binding(&self) -> Result<Self::Reader, WaveError> {
        self.state().calls.read_bindings += 1;
        Ok(self.clone())
    }

    fn sign_binding(&self, signer: Address) -> Result<Self::Writer, WaveError> {
        self.state().calls.sign_bindings += 1;
        Ok(MockSigner { contract: self.clone(), signer })
    }
}

#[async_trait]
impl WaveReader for MockContract {
    async fn total_waves(&self) -> Result<u64, WaveError> {
        self.state().calls.total_waves += 1;
        Ok(self.read()?.waves.len() as u64)
    }

    async fn all_waves(&self) -> Result<Vec<WaveRecord>, WaveError> {
        self.state().calls.all_waves += 1;
        Ok(self.read()?.waves.clone())
    }

    async fn new_waves(&self) -> Result<WaveStream, WaveError> {
        let mut state = self.read()?;
        state.calls.subscriptions += 1;
        let (tx, rx) = mpsc::unbounded();
        state.subscribers.push(tx);
        Ok(rx.boxed())
    }
}

/// Signing binding of [`MockContract`].
#[derive(Clone, Debug)]
pub struct MockSigner {
    contract: MockContract,
    signer: Address,
}

#[async_trait]
impl WaveWriter for MockSigner {
    async fn wave(&self, message: &str) -> Result<PendingWave, WaveError> {
        let mut state = self.contract.state();
        state.calls.waves_sent += 1;
        if state.rejecting_sends {
            return Err(WaveError::InvalidRequest("user rejected the request".to_string()));
        }

        state.next_tx += 1;
        let tx_hash = TxHash::left_padding_from(&state.next_tx.to_be_bytes());
        let (settle, settled) = oneshot::channel();
        state.pending.push_back(PendingSend {
            tx_hash,
            from: self.signer,
            message: message.to_string(),
            settle,
        });

        let confirmation = async move {
            settled.await.unwrap_or(Err(WaveError::ConfirmationDropped(tx_hash)))
        };
        Ok(PendingWave::new(tx_hash, confirmation.boxed()))
    }
}
