mod logic; // Dump → sweep / notify sequencing
pub(crate) mod db_dump; // Dump provider trait and the mysqldump implementation

use std::process::ExitCode;
use tracing::info;

use crate::config::AppConfig;
use crate::notify::Notifier;
use db_dump::DumpProvider;
use logic::CycleOutcome;

pub use db_dump::MysqlDumpProvider;

/// Process-level result of one invocation. Only the dump step decides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::Failure => ExitCode::FAILURE,
        }
    }
}

/// Public entry point for the backup process: runs exactly one cycle.
///
/// After a successful dump the retention sweep gets up to the configured grace
/// period to finish; whatever it does, the status stays `Success`.
pub async fn run_backup_flow(
    app_config: &AppConfig,
    provider: &dyn DumpProvider,
    notifier: &dyn Notifier,
) -> RunStatus {
    info!("🚀 Starting database backup process");
    match logic::perform_backup_cycle(app_config, provider, notifier).await {
        CycleOutcome::Succeeded { artifact, sweep } => {
            sweep.join_with_grace(app_config.backup.sweep_grace).await;
            info!(
                "🎉 Backup completed successfully: {} (taken at {})",
                artifact.path.display(),
                artifact.created_at.to_rfc3339()
            );
            RunStatus::Success
        }
        CycleOutcome::Failed { .. } => RunStatus::Failure,
    }
}
