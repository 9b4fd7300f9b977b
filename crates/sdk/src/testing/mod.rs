//! Collaborators for testing code built on the SDK.
//!
//! [`MockWallet`] stands in for the wallet provider, [`MockContract`] for
//! the deployed contract and its bindings. [`TestPortal`] runs the real
//! alloy bindings against a portal deployed on Anvil.

mod contract;
mod node;
mod wallet;

pub use contract::{CallCounts, MockContract, MockSigner};
pub use node::{POLL_INTERVAL, TestPortal};
pub use wallet::MockWallet;
