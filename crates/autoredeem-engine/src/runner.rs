//! One guarded workflow run inside one browser session.
//!
//! The guard is consulted before the browser is launched. From the launch
//! on, the session is closed exactly once on every route out: terminal
//! state, unexpected error, or operator interrupt (including one that lands
//! while the browser is still starting).

use crate::backend::{Backend, BackendError};
use crate::exit_codes;
use crate::guard::{GuardError, IdempotencyGuard, RunLedger};
use crate::retention::{RetentionEngine, format_size};
use crate::workflow::{
    BalanceReport, FailureReason, TransferState, TransferWorkflow, WorkflowError, WorkflowOutcome,
};
use std::future::Future;
use std::path::Path;
use std::pin::{Pin, pin};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Failed to launch browser: {0}")]
    Launch(#[source] BackendError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

#[derive(Debug)]
pub enum SessionOutcome<T> {
    Finished(T),
    Error(RunError),
    Interrupted,
}

pub type RunOutcome = SessionOutcome<WorkflowOutcome>;
pub type CheckOutcome = SessionOutcome<BalanceReport>;

impl<T> SessionOutcome<T> {
    fn code_with(&self, finished: impl FnOnce(&T) -> i32) -> i32 {
        match self {
            SessionOutcome::Finished(value) => finished(value),
            SessionOutcome::Error(_) => exit_codes::UNEXPECTED,
            SessionOutcome::Interrupted => exit_codes::INTERRUPTED,
        }
    }
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        self.code_with(WorkflowOutcome::exit_code)
    }
}

impl CheckOutcome {
    pub fn exit_code(&self) -> i32 {
        self.code_with(|report| match report {
            BalanceReport::Balance { .. } => exit_codes::OK,
            BalanceReport::Blocked(reason) => reason.exit_code(),
        })
    }
}

/// Gate on the guard, then run the full workflow until it finishes or
/// `shutdown` resolves.
pub async fn run_once<B, L, S>(
    backend: &mut B,
    guard: &IdempotencyGuard<L>,
    workflow: &mut TransferWorkflow,
    shutdown: S,
) -> RunOutcome
where
    B: Backend + ?Sized,
    L: RunLedger,
    S: Future<Output = ()>,
{
    match guard.try_acquire_today() {
        Ok(true) => info!("Acquired today's run lock"),
        Ok(false) => return SessionOutcome::Finished(WorkflowOutcome::already_ran_today()),
        Err(e) => {
            error!("Could not check the run lock: {}", e);
            return SessionOutcome::Error(e.into());
        }
    }

    let mut shutdown = pin!(shutdown);
    if let Err(outcome) = launch_session(backend, shutdown.as_mut()).await {
        return outcome;
    }

    let before_close = workflow.config().delays.before_close();
    let outcome = match race(workflow.run(backend), shutdown).await {
        Some(Ok(outcome)) => SessionOutcome::Finished(outcome),
        Some(Err(e)) => SessionOutcome::Error(e.into()),
        None => SessionOutcome::Interrupted,
    };
    close_session(backend, pause_for(&outcome, before_close)).await;
    outcome
}

/// [`run_once`], then the retention pass over `log_dir`.
///
/// Cleanup only follows a session the guard let through and the operator
/// did not interrupt. A cleanup failure is logged and never changes the
/// outcome.
pub async fn run_and_prune<B, L, S>(
    backend: &mut B,
    guard: &IdempotencyGuard<L>,
    workflow: &mut TransferWorkflow,
    retention: &RetentionEngine,
    log_dir: &Path,
    shutdown: S,
) -> RunOutcome
where
    B: Backend + ?Sized,
    L: RunLedger,
    S: Future<Output = ()>,
{
    let outcome = run_once(backend, guard, workflow, shutdown).await;
    if held_a_session(&outcome) {
        match retention.apply(log_dir, false) {
            Ok(report) => info!(
                "Artifact cleanup removed {} file(s), {}",
                report.removed_count,
                format_size(report.removed_bytes)
            ),
            Err(e) => warn!("Artifact cleanup failed: {}", e),
        }
    }
    outcome
}

fn held_a_session(outcome: &RunOutcome) -> bool {
    match outcome {
        SessionOutcome::Finished(run) => {
            run.state != TransferState::Failed(FailureReason::AlreadyRanToday)
        }
        SessionOutcome::Error(RunError::Guard(_)) | SessionOutcome::Interrupted => false,
        SessionOutcome::Error(_) => true,
    }
}

/// Balance-only check. Never consults the guard.
pub async fn check_once<B, S>(
    backend: &mut B,
    workflow: &mut TransferWorkflow,
    shutdown: S,
) -> CheckOutcome
where
    B: Backend + ?Sized,
    S: Future<Output = ()>,
{
    let mut shutdown = pin!(shutdown);
    if let Err(outcome) = launch_session(backend, shutdown.as_mut()).await {
        return outcome;
    }

    let before_close = workflow.config().delays.before_close();
    let outcome = match race(workflow.check_balance(backend), shutdown).await {
        Some(Ok(report)) => SessionOutcome::Finished(report),
        Some(Err(e)) => SessionOutcome::Error(e.into()),
        None => SessionOutcome::Interrupted,
    };
    close_session(backend, pause_for(&outcome, before_close)).await;
    outcome
}

/// Launch the browser while already listening for `shutdown`, so an
/// interrupt during a slow start still closes the session.
async fn launch_session<B, S, T>(
    backend: &mut B,
    shutdown: Pin<&mut S>,
) -> Result<(), SessionOutcome<T>>
where
    B: Backend + ?Sized,
    S: Future<Output = ()>,
{
    match race(backend.launch(), shutdown).await {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => {
            error!("Failed to launch browser: {}", e);
            close_session(backend, Duration::ZERO).await;
            Err(SessionOutcome::Error(RunError::Launch(e)))
        }
        None => {
            close_session(backend, Duration::ZERO).await;
            Err(SessionOutcome::Interrupted)
        }
    }
}

/// `None` if `shutdown` fired first; `work` is dropped mid-flight.
async fn race<T, W, S>(work: W, shutdown: S) -> Option<T>
where
    W: Future<Output = T>,
    S: Future<Output = ()>,
{
    tokio::select! {
        value = work => Some(value),
        () = shutdown => {
            warn!("Interrupted by user");
            None
        }
    }
}

fn pause_for<T>(outcome: &SessionOutcome<T>, before_close: Duration) -> Duration {
    match outcome {
        SessionOutcome::Interrupted => Duration::ZERO,
        _ => before_close,
    }
}

async fn close_session<B: Backend + ?Sized>(backend: &mut B, pause: Duration) {
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
    if let Err(e) = backend.close().await {
        warn!("Failed to close browser cleanly: {}", e);
    }
}
