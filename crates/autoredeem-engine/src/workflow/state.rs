use crate::exit_codes;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    TransferInitiated,
    /// Balance under the threshold; nothing was clicked.
    NoActionNeeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    AlreadyRanToday,
    MissingCredentials,
    LoginError,
    SecurityChallenge,
    MethodNotFound,
    ContinueNotFound,
    RedeemNotFound,
    ConfirmationMismatch,
}

impl FailureReason {
    pub fn exit_code(&self) -> i32 {
        match self {
            FailureReason::AlreadyRanToday => exit_codes::OK,
            FailureReason::MissingCredentials => exit_codes::MISSING_CREDENTIALS,
            FailureReason::LoginError => exit_codes::LOGIN_ERROR,
            FailureReason::SecurityChallenge => exit_codes::SECURITY_CHALLENGE,
            FailureReason::MethodNotFound => exit_codes::METHOD_NOT_FOUND,
            FailureReason::ContinueNotFound => exit_codes::CONTINUE_NOT_FOUND,
            FailureReason::RedeemNotFound => exit_codes::REDEEM_NOT_FOUND,
            FailureReason::ConfirmationMismatch => exit_codes::CONFIRMATION_MISMATCH,
        }
    }

    /// Tag of the screenshot captured when the workflow stops here.
    pub fn screenshot_tag(&self) -> Option<&'static str> {
        match self {
            FailureReason::AlreadyRanToday => None,
            FailureReason::MissingCredentials => Some("login_required"),
            FailureReason::LoginError => Some("login_failed"),
            FailureReason::SecurityChallenge => Some("security_challenge"),
            FailureReason::MethodNotFound => Some("direct_deposit_not_found"),
            FailureReason::ContinueNotFound => Some("continue_button_not_found"),
            FailureReason::RedeemNotFound => Some("redeem_button_not_found"),
            FailureReason::ConfirmationMismatch => Some("continue_failed"),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            FailureReason::AlreadyRanToday => "transfer already completed today",
            FailureReason::MissingCredentials => "login required but no credentials are set",
            FailureReason::LoginError => "login failed",
            FailureReason::SecurityChallenge => "security challenge detected",
            FailureReason::MethodNotFound => "bank direct deposit option not found",
            FailureReason::ContinueNotFound => "continue button not found",
            FailureReason::RedeemNotFound => "redeem button not found",
            FailureReason::ConfirmationMismatch => "confirmation page not recognized",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionReason::TransferInitiated => f.write_str("transfer initiated"),
            CompletionReason::NoActionNeeded => f.write_str("balance below threshold"),
        }
    }
}

/// Where one workflow run is. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum TransferState {
    Idle,
    Navigating,
    LoggingIn,
    SecurityChallenge,
    CheckingBalance,
    SelectingPayoutMethod,
    AwaitingContinue,
    ConfirmingRedeem,
    Redeeming,
    Completed(CompletionReason),
    Failed(FailureReason),
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Completed(_) | TransferState::Failed(_))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            TransferState::Completed(_) => Some(exit_codes::OK),
            TransferState::Failed(reason) => Some(reason.exit_code()),
            _ => None,
        }
    }

    /// Screenshot captured on entering this state, for terminal states.
    pub fn screenshot_tag(&self) -> Option<&'static str> {
        match self {
            TransferState::Completed(CompletionReason::TransferInitiated) => {
                Some("transfer_completed")
            }
            TransferState::Completed(CompletionReason::NoActionNeeded) => {
                Some("balance_below_threshold")
            }
            TransferState::Failed(reason) => reason.screenshot_tag(),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransferState::Idle => "idle",
            TransferState::Navigating => "navigating",
            TransferState::LoggingIn => "logging_in",
            TransferState::SecurityChallenge => "security_challenge",
            TransferState::CheckingBalance => "checking_balance",
            TransferState::SelectingPayoutMethod => "selecting_payout_method",
            TransferState::AwaitingContinue => "awaiting_continue",
            TransferState::ConfirmingRedeem => "confirming_redeem",
            TransferState::Redeeming => "redeeming",
            TransferState::Completed(_) => "completed",
            TransferState::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferState::Completed(reason) => write!(f, "completed ({})", reason),
            TransferState::Failed(reason) => write!(f, "failed ({})", reason),
            other => f.write_str(other.name()),
        }
    }
}
