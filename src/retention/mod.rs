mod sweep; // Directory scan and per-entry eviction

pub use sweep::sweep;

use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::errors::{SweepEntryFailure, SweepError};

const SECONDS_PER_DAY: u64 = 86_400;

/// How long artifacts are kept, and which entry is never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub window: Duration,
    /// File name of the reserved placeholder entry.
    pub sentinel: String,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_days(30)
    }
}

impl RetentionPolicy {
    pub fn from_days(days: u64) -> Self {
        Self {
            window: Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY)),
            sentinel: ".gitkeep".to_string(),
        }
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn is_sentinel(&self, name: &str) -> bool {
        name == self.sentinel
    }

    /// Strictly older than the window. A change time in the future counts as age zero.
    pub fn is_expired(&self, changed: SystemTime, now: SystemTime) -> bool {
        let age = now.duration_since(changed).unwrap_or(Duration::ZERO);
        age > self.window
    }
}

/// Outcome of one sweep over the backup directory.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub deleted: Vec<PathBuf>,
    pub retained: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<SweepEntryFailure>,
}

impl SweepReport {
    pub fn log_summary(&self) {
        info!(
            deleted = self.deleted.len(),
            retained = self.retained.len(),
            skipped = self.skipped.len(),
            failed = self.failures.len(),
            "🧹 Retention sweep finished"
        );
    }
}

/// Background sweep started after a successful dump.
pub struct SweepHandle {
    task: JoinHandle<Result<SweepReport, SweepError>>,
}

/// Starts the sweep on the runtime without waiting for it.
pub fn spawn_sweep(
    dir: PathBuf,
    policy: RetentionPolicy,
    now: SystemTime,
    concurrency: usize,
) -> SweepHandle {
    let task = tokio::spawn(async move { sweep(&dir, &policy, now, concurrency).await });
    SweepHandle { task }
}

impl SweepHandle {
    pub async fn join(self) -> Result<SweepReport, SweepError> {
        self.task.await?
    }

    /// Waits at most `grace` for the sweep. Failures and timeouts are logged, never returned.
    pub async fn join_with_grace(self, grace: Duration) -> Option<SweepReport> {
        match tokio::time::timeout(grace, self.join()).await {
            Ok(Ok(report)) => {
                report.log_summary();
                Some(report)
            }
            Ok(Err(e)) => {
                warn!("⚠️ Retention sweep failed: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    "⚠️ Retention sweep still running after {}s, exiting without waiting for it",
                    grace.as_secs()
                );
                None
            }
        }
    }
}
