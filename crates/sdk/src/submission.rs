//! Submission flow of a single wave.
//!
//! ```text
//!  Idle --begin--> Submitting --sent--> AwaitingConfirmation --settled--> Idle
//!                      |
//!                      +--send_failed--> Idle
//! ```
//!
//! Guards of [`SubmissionFlow::begin`] run in order: empty message, wrong
//! network, submission already in flight. The in-flight flag clears only
//! once the confirmation settles, never right after the send.

use alloy::primitives::TxHash;

/// State of the submission flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    /// Guards passed, waiting for the wallet to sign and send.
    Submitting,
    /// Transaction sent, waiting for it to be mined.
    AwaitingConfirmation(TxHash),
}

/// Reason a submission was refused before any contract call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Please fill message")]
    EmptyMessage,
    #[error("Please switch to the required test network")]
    WrongNetwork,
    #[error("A wave is already being mined")]
    InFlight,
}

/// User-facing notification raised by the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Wallet provider is missing; blocks the whole feature.
    NoWallet,
    /// Account list became empty.
    NoAuthorizedAccount,
    Rejected(Rejection),
    Pending(TxHash),
    Mined(TxHash),
    Failed(TxHash),
}

impl Notice {
    /// Blocking notices replace the whole view instead of a transient toast.
    pub fn is_blocking(&self) -> bool { matches!(self, Notice::NoWallet) }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::NoWallet => write!(f, "No wallet found!"),
            Notice::NoAuthorizedAccount => write!(f, "No authorized account found"),
            Notice::Rejected(rejection) => write!(f, "{}", rejection),
            Notice::Pending(_) => write!(f, "Mining, hold tight!"),
            Notice::Mined(_) => write!(f, "Mined successfully!"),
            Notice::Failed(_) => write!(f, "Please wait 5 min and try again"),
        }
    }
}

/// Submission state machine, independent of any UI.
#[derive(Clone, Debug, Default)]
pub struct SubmissionFlow {
    state: SubmissionState,
}

impl SubmissionFlow {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self) -> SubmissionState { self.state }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool { self.state == SubmissionState::Idle }

    /// Checks the guards and moves to [`SubmissionState::Submitting`].
    ///
    /// Whitespace-only messages count as empty.
    pub fn begin(&mut self, message: &str, network_correct: bool) -> Result<(), Rejection> {
        if message.trim().is_empty() {
            return Err(Rejection::EmptyMessage);
        }
        if !network_correct {
            return Err(Rejection::WrongNetwork);
        }
        if self.state != SubmissionState::Idle {
            return Err(Rejection::InFlight);
        }
        self.state = SubmissionState::Submitting;
        Ok(())
    }

    /// Transaction was handed to the network.
    pub fn sent(&mut self, tx_hash: TxHash) -> Notice {
        self.state = SubmissionState::AwaitingConfirmation(tx_hash);
        Notice::Pending(tx_hash)
    }

    /// Signing or sending failed, no transaction exists.
    pub fn send_failed(&mut self) {
        if self.state == SubmissionState::Submitting {
            self.state = SubmissionState::Idle;
        }
    }

    /// Confirmation of `tx_hash` settled.
    ///
    /// Settlements of transactions other than the awaited one still produce
    /// a notice but leave the state untouched.
    pub fn settled(&mut self, tx_hash: TxHash, mined: bool) -> Notice {
        if self.state == SubmissionState::AwaitingConfirmation(tx_hash) {
            self.state = SubmissionState::Idle;
        }
        if mined { Notice::Mined(tx_hash) } else { Notice::Failed(tx_hash) }
    }

    /// Drops any submission in progress.
    pub fn reset(&mut self) { self.state = SubmissionState::Idle; }
}
