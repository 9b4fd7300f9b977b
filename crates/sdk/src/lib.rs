//! Wave Portal SDK.
//!
//! # Overview
//!
//! Client-side glue for the `WavePortal` smart contract: a wallet session,
//! contract bindings, an in-memory feed of waves and the submission flow
//! that sends new waves.
//!
//! Use [`session::Session::mount`] to bring up a session against a
//! [`wallet::WalletProvider`] and a [`contract::Gateway`], then drive it with
//! [`session::Session::next_update`] from the UI loop. All state is
//! re-derived from the chain on every mount; nothing is persisted.
//!
//! The components are usable on their own as well:
//!
//! * [`wallet::WalletSession`] tracks the authorized account and network
//!   correctness.
//! * [`contract::AlloyGateway`] builds read and signing bindings over any
//!   alloy [`alloy::providers::Provider`].
//! * [`feed::WaveFeed`] keeps the ordered wave history with idempotent
//!   merging of bulk reads and live events.
//! * [`submission::SubmissionFlow`] is the UI-independent state machine
//!   guarding submissions.
//!
//! # Limitations/follow-ups
//!
//! * Live `NewWave` delivery relies on log polling. WebSocket subscriptions
//!   would lower latency.
//!
//! * Waves with identical sender, message and timestamp collapse into one
//!   feed entry.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables colored card and table rendering of the feed. |
//! | `testing` | yes | Enables [`testing`] module. |

pub mod abi;
pub mod contract;
pub mod error;
pub mod feed;
pub mod session;
pub mod submission;
#[cfg(feature = "testing")]
pub mod testing;
pub mod types;
pub mod wallet;

use alloy::primitives::{Address, address};

/// Gas limit hint attached to every `wave` transaction.
pub const WAVE_GAS_LIMIT: u64 = 300_000;

#[derive(Clone, Debug)]
/// Network and contract the portal is deployed to.
pub struct Deployment {
    chain_id: u64,
    wave_portal: Address,
    explorer: String,
}

impl Deployment {
    pub fn rinkeby() -> Self {
        Self {
            chain_id: 4,
            wave_portal: address!("0x27dc3c63364A49dE5cfAA374b786Ad1f10d447e2"),
            explorer: "https://rinkeby.etherscan.io".to_string(),
        }
    }

    pub fn custom(
        chain_id: u64,
        wave_portal: Address,
        explorer: impl Into<String>,
    ) -> Self {
        Self { chain_id, wave_portal, explorer: explorer.into() }
    }

    /// Chain ID submissions are allowed on.
    pub fn chain_id(&self) -> u64 { self.chain_id }

    pub fn wave_portal(&self) -> Address { self.wave_portal }

    /// Base URL of the block explorer, without trailing slash.
    pub fn explorer(&self) -> &str { self.explorer.trim_end_matches('/') }

    /// Explorer page of the given address.
    pub fn address_url(&self, address: Address) -> String {
        format!("{}/address/{}", self.explorer(), address)
    }
}
