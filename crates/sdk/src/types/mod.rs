mod time;
mod wave;

use alloy::primitives::Address;
pub use time::relative_time;
pub use wave::*;

/// Wallet account currently in use, if any.
pub type Account = Option<Address>;

/// Unix timestamp in seconds.
pub type Timestamp = u64;
