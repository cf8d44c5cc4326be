//! The payout workflow, one step per [`TransferState`].
//!
//! Hard blockers (missing credentials, a challenge page, an unresolvable
//! primary target) end the run in `Failed(reason)` and are returned as values.
//! `WorkflowError` is reserved for failures nobody planned for.

use super::artifacts::ScreenshotWriter;
use super::state::{CompletionReason, FailureReason, TransferState};
use crate::backend::{Backend, BackendError};
use crate::challenge::detect_challenge;
use crate::config::AutoRedeemConfig;
use crate::money::{Amount, parse_money};
use crate::overlay::OverlayDismisser;
use crate::resolution::{LocatorResolver, Resolution};
use autoredeem_common::locator::{LocatorStrategy, Predicate};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

pub const LOADING_INDICATORS: &str = r#".loading, .spinner, [class*="spin"]"#;

/// Words on the final page that suggest the transfer went through.
pub const SUCCESS_WORDS: &[&str] = &["success", "complete", "initiated", "processing", "confirmed"];

pub const ENV_EMAIL: &str = "POSH_EMAIL";
pub const ENV_PASSWORD: &str = "POSH_PASS";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to load {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BackendError,
    },

    #[error("Browser error while {step}: {source}")]
    Backend {
        step: &'static str,
        #[source]
        source: BackendError,
    },
}

impl WorkflowError {
    fn backend(step: &'static str) -> impl FnOnce(BackendError) -> Self {
        move |source| WorkflowError::Backend { step, source }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Both `POSH_EMAIL` and `POSH_PASS` must be set and non-empty.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = lookup(ENV_EMAIL).filter(|v| !v.trim().is_empty())?;
        let password = lookup(ENV_PASSWORD).filter(|v| !v.is_empty())?;
        Some(Self { email, password })
    }

    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How one workflow run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    pub state: TransferState,
    /// Balance used for the threshold decision, if the run got that far.
    pub balance: Option<Amount>,
    pub history: Vec<TransferState>,
    pub screenshots: Vec<PathBuf>,
}

impl WorkflowOutcome {
    /// The run the guard turned away: no browser, no artifacts.
    pub fn already_ran_today() -> Self {
        let state = TransferState::Failed(FailureReason::AlreadyRanToday);
        Self {
            state,
            balance: None,
            history: vec![TransferState::Idle, state],
            screenshots: Vec::new(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.state
            .exit_code()
            .unwrap_or(crate::exit_codes::UNEXPECTED)
    }
}

/// Result of a balance-only check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceReport {
    Balance {
        /// `None` when no amount could be parsed from the page.
        balance: Option<Amount>,
        threshold: Amount,
        meets_threshold: bool,
    },
    /// The page could not be reached.
    Blocked(FailureReason),
}

pub struct TransferWorkflow {
    config: AutoRedeemConfig,
    credentials: Option<Credentials>,
    dismisser: OverlayDismisser,
    screenshots: ScreenshotWriter,
    state: TransferState,
    history: Vec<TransferState>,
    balance: Option<Amount>,
    captured: Vec<PathBuf>,
}

impl TransferWorkflow {
    pub fn new(config: AutoRedeemConfig, credentials: Option<Credentials>) -> Self {
        let dismisser = OverlayDismisser::new(
            config.dismiss_policy(),
            config.strategies.overlay_dismiss.clone(),
            config.strategies.overlay_containers.clone(),
        );
        let screenshots = ScreenshotWriter::new(config.artifacts.log_dir.clone());
        Self {
            config,
            credentials,
            dismisser,
            screenshots,
            state: TransferState::Idle,
            history: vec![TransferState::Idle],
            balance: None,
            captured: Vec::new(),
        }
    }

    pub fn config(&self) -> &AutoRedeemConfig {
        &self.config
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn history(&self) -> &[TransferState] {
        &self.history
    }

    /// Drive the workflow from `Idle` to a terminal state.
    ///
    /// On an unexpected error an `error` screenshot is captured before the
    /// error is returned.
    pub async fn run<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        self.reset();
        match self.drive(backend, |_| false).await {
            Ok(()) => Ok(self.outcome()),
            Err(e) => {
                error!("ERROR: {}", e);
                self.capture(backend, "error").await;
                Err(e)
            }
        }
    }

    /// Navigate, log in if needed, clear overlays and read the balance.
    /// Never touches payout controls.
    pub async fn check_balance<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<BalanceReport, WorkflowError> {
        self.reset();
        let stop_at_balance = |state: TransferState| state == TransferState::CheckingBalance;
        if let Err(e) = self.drive(backend, stop_at_balance).await {
            error!("ERROR: {}", e);
            self.capture(backend, "error").await;
            return Err(e);
        }

        if let TransferState::Failed(reason) = self.state {
            return Ok(BalanceReport::Blocked(reason));
        }

        self.dismisser.dismiss_all(backend).await;
        let text = backend
            .page_text()
            .await
            .map_err(WorkflowError::backend("reading the balance"))?;
        let balance = parse_money(&text);
        let threshold = self.config.transfer.min_transfer;
        let meets_threshold = balance.is_some_and(|amount| amount >= threshold);
        match balance {
            Some(amount) => info!("Found balance: {}", amount),
            None => warn!("No redeemable balance found or could not parse balance"),
        }
        self.balance = balance;
        Ok(BalanceReport::Balance {
            balance,
            threshold,
            meets_threshold,
        })
    }

    fn reset(&mut self) {
        self.state = TransferState::Idle;
        self.history = vec![TransferState::Idle];
        self.balance = None;
        self.captured.clear();
    }

    fn outcome(&self) -> WorkflowOutcome {
        WorkflowOutcome {
            state: self.state,
            balance: self.balance,
            history: self.history.clone(),
            screenshots: self.captured.clone(),
        }
    }

    async fn drive<B, F>(&mut self, backend: &mut B, stop: F) -> Result<(), WorkflowError>
    where
        B: Backend + ?Sized,
        F: Fn(TransferState) -> bool,
    {
        while !self.state.is_terminal() && !stop(self.state) {
            let next = self.step(backend).await?;
            self.transition(backend, next).await;
        }
        Ok(())
    }

    async fn transition<B: Backend + ?Sized>(&mut self, backend: &mut B, next: TransferState) {
        info!("State: {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);

        match next {
            TransferState::Completed(reason) => info!("Workflow completed: {}", reason),
            TransferState::Failed(reason) => error!("Workflow failed: {}", reason),
            _ => {}
        }
        if let Some(tag) = next.screenshot_tag() {
            self.capture(backend, tag).await;
        }
    }

    async fn capture<B: Backend + ?Sized>(&mut self, backend: &mut B, tag: &str) {
        if let Some(path) = self.screenshots.capture(backend, tag).await {
            self.captured.push(path);
        }
    }

    async fn step<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<TransferState, WorkflowError> {
        match self.state {
            TransferState::Idle => Ok(TransferState::Navigating),
            TransferState::Navigating => self.navigate(backend).await,
            TransferState::LoggingIn => self.log_in(backend).await,
            TransferState::SecurityChallenge => {
                error!("SECURITY CHALLENGE DETECTED!");
                error!("Open Chrome with this profile and complete the challenge:");
                error!(
                    "chrome --user-data-dir='{}'",
                    self.config.browser.user_data_dir.display()
                );
                Ok(TransferState::Failed(FailureReason::SecurityChallenge))
            }
            TransferState::CheckingBalance => self.check_threshold(backend).await,
            TransferState::SelectingPayoutMethod => self.select_payout_method(backend).await,
            TransferState::AwaitingContinue => self.click_continue(backend).await,
            TransferState::ConfirmingRedeem => self.confirm(backend).await,
            TransferState::Redeeming => self.redeem(backend).await,
            terminal @ (TransferState::Completed(_) | TransferState::Failed(_)) => Ok(terminal),
        }
    }

    async fn navigate<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<TransferState, WorkflowError> {
        info!("Navigating to payout options page...");
        self.load_payout_page(backend)
            .await
            .map_err(|source| WorkflowError::Navigation {
                url: self.config.site.payout_url.clone(),
                source,
            })?;

        if self.login_required(backend).await? {
            return Ok(TransferState::LoggingIn);
        }
        self.arrival_checkpoint(backend).await
    }

    async fn load_payout_page<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<(), BackendError> {
        backend
            .navigate(&self.config.site.payout_url, self.config.timeouts.navigation())
            .await?;
        self.wait_for_idle(backend, self.config.timeouts.network_idle())
            .await;
        Ok(())
    }

    async fn wait_for_idle<B: Backend + ?Sized>(&self, backend: &mut B, timeout: std::time::Duration) {
        if let Err(e) = backend.wait_for_network_idle(timeout).await {
            warn!("Page load timeout: {}", e);
        }
    }

    async fn login_required<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<bool, WorkflowError> {
        let url = backend
            .current_url()
            .await
            .map_err(WorkflowError::backend("reading the current URL"))?;
        if url
            .to_lowercase()
            .contains(&self.config.site.login_url_token.to_lowercase())
        {
            return Ok(true);
        }
        Ok(
            LocatorResolver::resolve(backend, &self.config.strategies.login_detect)
                .await
                .is_found(),
        )
    }

    async fn log_in<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<TransferState, WorkflowError> {
        let Some(credentials) = self.credentials.clone() else {
            error!("ERROR: Login required but credentials not provided.");
            error!("Set POSH_EMAIL and POSH_PASS, or run with --visible to log in manually once.");
            return Ok(TransferState::Failed(FailureReason::MissingCredentials));
        };

        info!("Attempting to login...");
        if let Err(reason) = self.submit_login(backend, &credentials).await {
            error!("Login failed: {}", reason);
            return Ok(TransferState::Failed(FailureReason::LoginError));
        }
        self.arrival_checkpoint(backend).await
    }

    /// The login form, then back to the payout page. Any failure is a login
    /// error, described by the returned message.
    async fn submit_login<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        credentials: &Credentials,
    ) -> Result<(), String> {
        let tables = &self.config.strategies;
        fill_or_fail(backend, &tables.login_email, &credentials.email, "email field").await?;
        fill_or_fail(
            backend,
            &tables.login_password,
            &credentials.password,
            "password field",
        )
        .await?;
        if !LocatorResolver::resolve_and_perform(backend, &tables.login_submit, None)
            .await
            .is_found()
        {
            return Err("login button not found".to_string());
        }

        self.wait_for_idle(backend, self.config.timeouts.login_idle())
            .await;
        tokio::time::sleep(self.config.delays.post_login()).await;

        info!("Navigating to payout options after login...");
        self.load_payout_page(backend)
            .await
            .map_err(|e| format!("payout options page failed to load after login: {}", e))?;

        // A rejected login keeps redirecting to the form.
        match self.login_required(backend).await {
            Ok(false) => Ok(()),
            Ok(true) => Err("still on the login page after submitting credentials".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn arrival_checkpoint<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<TransferState, WorkflowError> {
        if self.challenge_present(backend).await? {
            return Ok(TransferState::SecurityChallenge);
        }
        Ok(TransferState::CheckingBalance)
    }

    async fn challenge_present<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<bool, WorkflowError> {
        let url = backend
            .current_url()
            .await
            .map_err(WorkflowError::backend("checking for a security challenge"))?;
        let text = backend
            .page_text()
            .await
            .map_err(WorkflowError::backend("checking for a security challenge"))?;
        match detect_challenge(&url, &text) {
            Some(token) => {
                warn!("Security challenge indicator found: '{}'", token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn check_threshold<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<TransferState, WorkflowError> {
        self.dismisser.dismiss_all(backend).await;
        self.capture(backend, "payout_options_page").await;

        info!("Checking for redeemable balance...");
        let text = backend
            .page_text()
            .await
            .map_err(WorkflowError::backend("reading the balance"))?;
        let balance = match parse_money(&text) {
            Some(amount) => {
                info!("Found balance: {}", amount);
                amount
            }
            None => {
                let fallback = self.config.transfer.unparsed_balance;
                warn!(
                    "No redeemable balance found or could not parse balance; assuming {}",
                    fallback
                );
                fallback
            }
        };
        self.balance = Some(balance);

        let threshold = self.config.transfer.min_transfer;
        if balance < threshold {
            info!(
                "Balance {} is below threshold {}. No transfer needed.",
                balance, threshold
            );
            return Ok(TransferState::Completed(CompletionReason::NoActionNeeded));
        }
        Ok(TransferState::SelectingPayoutMethod)
    }

    async fn select_payout_method<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<TransferState, WorkflowError> {
        info!("Looking for Bank Direct Deposit option...");
        let table = &self.config.strategies.payout_method;
        match LocatorResolver::resolve_and_perform(backend, table, None).await {
            Resolution::Found { strategy_index, .. } => {
                info!(
                    "Found Bank Direct Deposit option using strategy {}",
                    strategy_index + 1
                );
                Ok(TransferState::AwaitingContinue)
            }
            Resolution::NotFound { .. } => {
                error!("ERROR: Could not find Bank Direct Deposit option");
                Ok(TransferState::Failed(FailureReason::MethodNotFound))
            }
        }
    }

    async fn click_continue<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<TransferState, WorkflowError> {
        info!("Waiting for page to finish loading after selection...");
        let no_spinner = Predicate::SelectorAbsent(LOADING_INDICATORS.to_string());
        match backend
            .wait_for_predicate(&no_spinner, self.config.timeouts.loading())
            .await
        {
            Ok(()) => info!("Loading spinners disappeared"),
            Err(e) => warn!("Timeout waiting for loading spinners, continuing anyway: {}", e),
        }
        tokio::time::sleep(self.config.delays.post_selection()).await;
        self.dismisser.dismiss_all(backend).await;

        info!("Looking for Continue button...");
        let table = &self.config.strategies.continue_button;
        match LocatorResolver::resolve_and_perform(backend, table, None).await {
            Resolution::Found { strategy_index, .. } => {
                info!("Clicked Continue button using strategy {}", strategy_index + 1);
                Ok(TransferState::ConfirmingRedeem)
            }
            Resolution::NotFound { .. } => {
                error!("ERROR: Could not find or click Continue button");
                Ok(TransferState::Failed(FailureReason::ContinueNotFound))
            }
        }
    }

    async fn confirm<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<TransferState, WorkflowError> {
        info!("Waiting for confirmation page to load...");
        tokio::time::sleep(self.config.delays.confirmation()).await;
        self.dismisser.dismiss_all(backend).await;

        if self.challenge_present(backend).await? {
            return Ok(TransferState::SecurityChallenge);
        }

        let url = backend
            .current_url()
            .await
            .map_err(WorkflowError::backend("reading the confirmation URL"))?;
        info!("Current URL after Continue click: {}", url);
        let text = backend
            .page_text()
            .await
            .map_err(WorkflowError::backend("reading the confirmation page"))?;

        let site = &self.config.site;
        let confirmed = text
            .to_lowercase()
            .contains(&site.confirmation_text.to_lowercase())
            || url.contains(&site.confirmation_url_token);
        if confirmed {
            info!("Reached confirmation page");
        } else if self.config.transfer.strict_confirmation {
            error!("ERROR: Confirmation page not recognized at {}", url);
            return Ok(TransferState::Failed(FailureReason::ConfirmationMismatch));
        } else {
            warn!(
                "Confirmation indicators not found on {}; proceeding anyway",
                url
            );
        }

        self.capture(backend, "confirmation_page").await;
        Ok(TransferState::Redeeming)
    }

    async fn redeem<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<TransferState, WorkflowError> {
        info!("Looking for final Redeem button...");
        let table = &self.config.strategies.redeem_button;
        match LocatorResolver::resolve_and_perform(backend, table, None).await {
            Resolution::Found { strategy_index, .. } => {
                info!("Clicked Redeem button using strategy {}", strategy_index + 1);
            }
            Resolution::NotFound { .. } => {
                error!("ERROR: Could not find or click final Redeem button");
                return Ok(TransferState::Failed(FailureReason::RedeemNotFound));
            }
        }

        tokio::time::sleep(self.config.delays.post_redeem()).await;
        info!("Transfer initiated");

        match backend.page_text().await {
            Ok(text) => {
                let text = text.to_lowercase();
                if SUCCESS_WORDS.iter().any(|word| text.contains(word)) {
                    info!("Success indicators found on page");
                } else {
                    warn!("No clear success indicators found - please verify manually");
                }
            }
            Err(e) => warn!("Could not read final page: {}", e),
        }
        Ok(TransferState::Completed(CompletionReason::TransferInitiated))
    }
}

async fn fill_or_fail<B: Backend + ?Sized>(
    backend: &mut B,
    table: &[LocatorStrategy],
    value: &str,
    what: &str,
) -> Result<(), String> {
    if LocatorResolver::resolve_and_perform(backend, table, Some(value))
        .await
        .is_found()
    {
        Ok(())
    } else {
        Err(format!("{} not found", what))
    }
}
