//! Scheduled MySQL snapshot tool
//!
//! One invocation takes one dump, prunes expired dumps and emails the operator on failure.
//! Repetition is left to cron or a similar scheduler.

// dbsnapshot/src/main.rs
mod backup;
mod config;
mod errors;
mod notify;
mod retention;
mod utils;

use anyhow::{Context, Result};
use backup::{MysqlDumpProvider, RunStatus};
use config::AppConfig;
use notify::SendGridNotifier;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Main entry point for the backup tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    match run_app().await {
        Ok(status) => status.into(),
        Err(e) => {
            error!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<RunStatus> {
    let app_config = AppConfig::from_env()
        .context("Failed to load application configuration from environment")?;

    let provider = MysqlDumpProvider::new(&app_config.dump);
    let notifier = SendGridNotifier::new(&app_config.notification)
        .context("Failed to build the mail client")?;

    Ok(backup::run_backup_flow(&app_config, &provider, &notifier).await)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
