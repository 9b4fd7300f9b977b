use alloy::primitives::TxHash;

use crate::submission::Rejection;

#[derive(Debug, thiserror::Error)]
pub enum WaveError {
    #[error("no wallet found")]
    NoWallet,

    #[error("no account connected")]
    NotConnected,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("confirmation of transaction {0} was dropped")]
    ConfirmationDropped(TxHash),

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy::transports::TransportError),

    #[error("contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy::sol_types::Error),

    #[error("pending transaction error: {0}")]
    PendingTransaction(#[from] alloy::providers::PendingTransactionError),
}
