use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{error, info, warn};

use super::db_dump::DumpProvider;
use crate::config::AppConfig;
use crate::errors::DumpError;
use crate::notify::{FailureEvent, Notifier, notify_failure};
use crate::retention::{SweepHandle, spawn_sweep};
use crate::utils::change_time;

/// A completed dump file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub path: PathBuf,
    /// Change time of the written file, the same clock the retention sweep ages it by.
    pub created_at: DateTime<Utc>,
}

/// Result of one dump → sweep / notify cycle.
pub enum CycleOutcome {
    Succeeded {
        artifact: BackupArtifact,
        sweep: SweepHandle,
    },
    Failed {
        error: DumpError,
    },
}

/// `backup_<YYYYMMDDHHMMSS>.sql` in UTC, so name order is chronological order.
pub fn backup_filename(now: DateTime<Utc>) -> String {
    format!("backup_{}.sql", now.format("%Y%m%d%H%M%S"))
}

/// Dumps the configured database into a new timestamped file under the backup directory.
///
/// An existing file with the same name (two runs within one second) is left
/// untouched and reported as `DumpError::ArtifactExists`. A partial file left by a
/// failed provider is removed.
pub async fn run_dump(
    config: &AppConfig,
    provider: &dyn DumpProvider,
    now: DateTime<Utc>,
) -> Result<BackupArtifact, DumpError> {
    let backup_dir = &config.backup.backup_dir;
    fs::create_dir_all(backup_dir).await?;

    let path = backup_dir.join(backup_filename(now));
    if fs::try_exists(&path).await? {
        return Err(DumpError::ArtifactExists(path));
    }

    if let Err(e) = provider.dump(&config.database, &path).await {
        discard_partial_output(&path).await;
        return Err(e);
    }

    // A provider that reports success without leaving a file is a failed dump.
    let metadata = fs::metadata(&path).await?;
    let created_at = DateTime::<Utc>::from(change_time(&metadata)?);
    Ok(BackupArtifact { path, created_at })
}

async fn discard_partial_output(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => warn!("Removed incomplete dump file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "⚠️ Failed to remove incomplete dump file {}: {}",
            path.display(),
            e
        ),
    }
}

/// Runs one backup cycle.
///
/// On success the retention sweep is started in the background and its handle
/// returned. On failure exactly one alert is sent and the sweep is not run.
pub async fn perform_backup_cycle(
    config: &AppConfig,
    provider: &dyn DumpProvider,
    notifier: &dyn Notifier,
) -> CycleOutcome {
    match run_dump(config, provider, Utc::now()).await {
        Ok(artifact) => {
            info!(
                "✅ Database backup completed successfully: {}",
                artifact.path.display()
            );
            let sweep = spawn_sweep(
                config.backup.backup_dir.clone(),
                config.backup.retention.clone(),
                SystemTime::now(),
                config.backup.sweep_concurrency,
            );
            CycleOutcome::Succeeded { artifact, sweep }
        }
        Err(error) => {
            error!("❌ An error occurred during the database backup: {}", error);
            notify_failure(notifier, &config.notification, FailureEvent::new(&error)).await;
            CycleOutcome::Failed { error }
        }
    }
}
