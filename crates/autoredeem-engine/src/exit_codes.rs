//! Stable process exit codes.

/// Transfer started, nothing to do, or already ran today.
pub const OK: i32 = 0;
/// Unexpected error: backend crash, I/O failure, bad configuration.
pub const UNEXPECTED: i32 = 1;
/// No credentials available for a login the site demanded.
pub const MISSING_CREDENTIALS: i32 = 2;
/// A login step failed.
pub const LOGIN_ERROR: i32 = 3;
/// The site showed an anti-automation challenge.
pub const SECURITY_CHALLENGE: i32 = 4;
/// No payout-method strategy matched.
pub const METHOD_NOT_FOUND: i32 = 5;
/// No continue-button strategy matched.
pub const CONTINUE_NOT_FOUND: i32 = 6;
/// No redeem-button strategy matched.
pub const REDEEM_NOT_FOUND: i32 = 7;
/// The confirmation page was not recognized under strict confirmation.
pub const CONFIRMATION_MISMATCH: i32 = 8;
/// Interrupted by the operator (128 + SIGINT).
pub const INTERRUPTED: i32 = 130;
