mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "autoredeem",
    version,
    about = "Daily payout redemption for a marketplace seller account"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Redeem the balance if it meets the threshold, then clean old artifacts
    Run {
        /// Config file (defaults to ./autoredeem.yaml, then ~/.autoredeem/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Launch browser in visible mode (not headless)
        #[arg(long)]
        visible: bool,
    },
    /// Report the redeemable balance without transferring anything
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        visible: bool,
    },
    /// Apply the retention policy to the artifact directory
    Cleanup {
        /// Report what would be removed without deleting
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        log_dir: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List artifacts newest first
    Artifacts {
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Show at most N entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    // A missing .env is the normal case.
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Run { config, visible } => commands::run(config.as_deref(), visible).await,
        Command::Check { config, visible } => commands::check(config.as_deref(), visible).await,
        Command::Cleanup {
            dry_run,
            log_dir,
            config,
        } => commands::cleanup(config.as_deref(), log_dir, dry_run).await,
        Command::Artifacts { log_dir, limit } => commands::artifacts(log_dir, limit).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            autoredeem_engine::exit_codes::UNEXPECTED
        }
    };
    std::process::exit(code);
}
