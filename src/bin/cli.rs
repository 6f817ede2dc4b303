//! Outage watcher CLI
//!
//! Polls the schedule page and posts changes to Telegram.

use std::future::Future;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use outage_watch::{
    error::Result,
    models::Config,
    pipeline::{CycleOutcome, Poller},
};

/// outage-watch - Outage Schedule Notifier
#[derive(Parser, Debug)]
#[command(
    name = "outage-watch",
    version,
    about = "Watches an outage schedule page and posts changes to Telegram"
)]
struct Cli {
    /// Path to the TOML config file (environment variables override it)
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Poll forever (default)
    Run,

    /// Run a single cycle and exit
    Once,

    /// Fetch and print the current table without sending or saving anything
    Preview,

    /// Validate configuration
    Validate,

    /// Show the saved state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Config file if one exists, then environment overrides.
fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::load_if_present(path)?;
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

/// Resolves on SIGINT or SIGTERM. Handlers are installed before returning, so a
/// signal during a cycle is held until the poller next waits.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => log::info!("Received SIGINT"),
            _ = terminate.recv() => log::info!("Received SIGTERM"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        log::info!("Received Ctrl+C");
    })
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli.config)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            config.validate()?;
            let shutdown = shutdown_signal()?;
            let mut poller = Poller::from_config(&config)?;
            poller.run_until(shutdown).await;
        }

        Command::Once => {
            config.validate()?;
            let mut poller = Poller::from_config(&config)?;
            poller.prime().await;

            match poller.run_cycle().await {
                Ok(CycleOutcome::NoRecords) => log::info!("No schedule lines found"),
                Ok(CycleOutcome::Unchanged { token }) => log::info!("No changes (token {})", token),
                Ok(CycleOutcome::Notified { token, rows }) => {
                    log::info!("Sent {} rows, saved token {}", rows, token)
                }
                Err(e) => {
                    log::error!("Cycle failed [{}]: {}", e.kind(), e);
                    return Err(e);
                }
            }
        }

        Command::Preview => {
            let poller = Poller::from_config(&config)?;
            let preview = poller.preview().await?;

            println!("{}", preview.title);
            println!("{}", preview.table);
            match preview.token {
                Some(token) => log::info!("{} records, token {}", preview.snapshot.len(), token),
                None => log::warn!("No schedule lines found"),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::debug!("{:#?}", config);
            log::info!("✓ Config OK");
        }

        Command::Info => {
            let poller = Poller::from_config(&config)?;
            log::info!("Source: {}", config.source.url);
            log::info!("State file: {}", config.state.path.display());
            match poller.stored_token().await? {
                Some(token) => log::info!("Last notified token: {}", token),
                None => log::info!("No token saved yet."),
            }
        }
    }

    Ok(())
}
