pub mod artifacts;
pub mod machine;
pub mod state;

pub use artifacts::ScreenshotWriter;
pub use machine::{BalanceReport, Credentials, TransferWorkflow, WorkflowError, WorkflowOutcome};
pub use state::{CompletionReason, FailureReason, TransferState};
