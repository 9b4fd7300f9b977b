use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use clap::{Parser, Subcommand};

pub(crate) const DEFAULT_RPC_PROVIDER: &str = "http://127.0.0.1:8545";
pub(crate) const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "wave-portal", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// RPC endpoint to connect to
    #[arg(long, global = true, default_value_t = DEFAULT_RPC_PROVIDER.to_string())]
    pub rpc: String,

    /// WavePortal contract address [default: Rinkeby deployment]
    #[arg(long, global = true)]
    pub contract: Option<Address>,

    /// Chain ID waves may be sent on [default: 4]
    #[arg(long, global = true)]
    pub chain_id: Option<u64>,

    /// Block explorer base URL [default: Rinkeby Etherscan]
    #[arg(long, global = true)]
    pub explorer: Option<String>,

    /// Private key to wave with [default: accounts managed by the node]
    #[arg(long, global = true)]
    pub private_key: Option<PrivateKeySigner>,

    /// Interval of polling the node for events, in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show wallet account, network and number of waves
    Status,
    /// Ask the wallet to authorize an account
    Connect,
    /// Show waves, most recent first
    Feed {
        /// Keep the feed live until terminated by (Ctrl+C)
        #[arg(long, default_value_t = false)]
        follow: bool,

        /// Number of updates to follow [default: unlimited]
        #[arg(long)]
        num_updates: Option<u64>,

        /// Render as a compact table instead of cards
        #[arg(long, default_value_t = false)]
        table: bool,
    },
    /// Wave with a message
    Wave {
        /// Message to send
        message: String,

        /// Return once the transaction is sent, without waiting for it to
        /// be mined
        #[arg(long, default_value_t = false)]
        no_wait: bool,
    },
}
