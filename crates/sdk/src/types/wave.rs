use alloy::primitives::Address;

use super::Timestamp;
use crate::abi::WavePortal;

/// A single wave as stored by the contract.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct WaveRecord {
    /// Address the wave was sent from.
    #[debug("{address}")]
    pub address: Address,

    pub message: String,

    /// Block timestamp the wave was mined at.
    pub timestamp: Timestamp,
}

/// Identity of a wave used to merge the bulk history with live events.
///
/// The contract assigns no sequence number to waves, so sender, block
/// timestamp and message together stand in for one.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct WaveKey {
    address: Address,
    timestamp: Timestamp,
    message: String,
}

impl WaveRecord {
    pub fn new(address: Address, message: impl Into<String>, timestamp: Timestamp) -> Self {
        Self { address, message: message.into(), timestamp }
    }

    pub fn key(&self) -> WaveKey {
        WaveKey { address: self.address, timestamp: self.timestamp, message: self.message.clone() }
    }
}

impl From<WavePortal::Wave> for WaveRecord {
    fn from(wave: WavePortal::Wave) -> Self {
        Self {
            address: wave.waver,
            message: wave.message,
            timestamp: wave.timestamp.saturating_to(),
        }
    }
}

impl From<WavePortal::NewWave> for WaveRecord {
    fn from(event: WavePortal::NewWave) -> Self {
        Self {
            address: event.from,
            message: event.message,
            timestamp: event.timestamp.saturating_to(),
        }
    }
}
