use anyhow::{Context, Result};
use autoredeem_engine::config::{AutoRedeemConfig, ConfigLoader};
use autoredeem_engine::exit_codes;
use autoredeem_engine::guard::{FileRunLedger, IdempotencyGuard};
use autoredeem_engine::retention::{RetentionEngine, format_size};
use autoredeem_engine::runner::{SessionOutcome, check_once, run_and_prune};
use autoredeem_engine::workflow::{BalanceReport, Credentials, TransferWorkflow};
use autoredeem_h::HeadlessBackend;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

async fn load_config(path: Option<&Path>, visible: bool) -> Result<AutoRedeemConfig> {
    let mut config = ConfigLoader::load(path)
        .await
        .context("Failed to load configuration")?;
    if visible {
        config.browser.headless = false;
    }
    Ok(config)
}

/// Resolves on Ctrl-C. The handler is installed on first poll, which the
/// runner does before launching the browser. If it cannot be installed,
/// never resolves.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

pub async fn run(config_path: Option<&Path>, visible: bool) -> Result<i32> {
    let config = load_config(config_path, visible).await?;
    let log_dir = config.artifacts.log_dir.clone();
    tokio::fs::create_dir_all(&log_dir)
        .await
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    info!("=== Starting Poshmark auto-redeem ===");
    info!("Minimum transfer amount: {}", config.transfer.min_transfer);
    info!("Headless mode: {}", config.browser.headless);

    let retention = RetentionEngine::new(config.retention.clone());
    let guard = IdempotencyGuard::new(FileRunLedger::new(&log_dir));
    let mut backend = HeadlessBackend::new(config.browser.clone());
    let mut workflow = TransferWorkflow::new(config, Credentials::from_env());

    let outcome = run_and_prune(
        &mut backend,
        &guard,
        &mut workflow,
        &retention,
        &log_dir,
        interrupted(),
    )
    .await;
    match &outcome {
        SessionOutcome::Finished(run) => {
            info!("Run finished: {}", run.state);
            for path in &run.screenshots {
                println!("{}", path.display());
            }
        }
        SessionOutcome::Error(e) => tracing::error!("Run failed: {}", e),
        SessionOutcome::Interrupted => warn!("Run interrupted"),
    }
    info!("Exit code {}", outcome.exit_code());
    Ok(outcome.exit_code())
}

pub async fn check(config_path: Option<&Path>, visible: bool) -> Result<i32> {
    let config = load_config(config_path, visible).await?;
    tokio::fs::create_dir_all(&config.artifacts.log_dir).await?;

    let mut backend = HeadlessBackend::new(config.browser.clone());
    let mut workflow = TransferWorkflow::new(config, Credentials::from_env());

    let outcome = check_once(&mut backend, &mut workflow, interrupted()).await;
    match &outcome {
        SessionOutcome::Finished(BalanceReport::Balance {
            balance,
            threshold,
            meets_threshold,
        }) => {
            let shown = balance.map_or_else(|| "unknown".to_string(), |b| b.to_string());
            println!(
                "balance={} threshold={} eligible={}",
                shown, threshold, meets_threshold
            );
        }
        SessionOutcome::Finished(BalanceReport::Blocked(reason)) => {
            println!("blocked: {}", reason.describe());
        }
        SessionOutcome::Error(e) => tracing::error!("Check failed: {}", e),
        SessionOutcome::Interrupted => warn!("Check interrupted"),
    }
    Ok(outcome.exit_code())
}

pub async fn cleanup(
    config_path: Option<&Path>,
    log_dir: Option<PathBuf>,
    dry_run: bool,
) -> Result<i32> {
    let config = load_config(config_path, false).await?;
    let dir = log_dir.unwrap_or(config.artifacts.log_dir);

    let report = RetentionEngine::new(config.retention)
        .apply(&dir, dry_run)
        .with_context(|| format!("Cleanup of {} failed", dir.display()))?;

    let verb = if dry_run { "would remove" } else { "removed" };
    for path in &report.removed {
        println!("{} {}", verb, path.display());
    }
    println!(
        "{} {} file(s), {}",
        verb,
        report.removed_count,
        format_size(report.removed_bytes)
    );
    if report.failures > 0 {
        warn!("{} file(s) could not be removed", report.failures);
    }
    Ok(exit_codes::OK)
}

pub async fn artifacts(log_dir: Option<PathBuf>, limit: Option<usize>) -> Result<i32> {
    let config = ConfigLoader::load(None)
        .await
        .context("Failed to load configuration")?;
    let dir = log_dir.unwrap_or(config.artifacts.log_dir);

    let listed = RetentionEngine::new(config.retention)
        .list(&dir)
        .with_context(|| format!("Could not list {}", dir.display()))?;

    let now = SystemTime::now();
    for artifact in listed.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{:<8} {:>9} {:>4}d  {}",
            artifact.category.as_str(),
            format_size(artifact.size_bytes),
            artifact.age_days(now),
            artifact.name()
        );
    }
    Ok(exit_codes::OK)
}
