// dbsnapshot/src/retention/sweep.rs
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{RetentionPolicy, SweepReport};
use crate::errors::{SweepEntryFailure, SweepError, SweepOp};
use crate::utils::change_time;

/// What the sweep knows about one directory entry after stat.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub path: PathBuf,
    pub name: String,
    pub is_file: bool,
    /// Inode change time (ctime), not the modification time.
    pub changed: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sentinel,
    NotAFile,
    Retain,
    Expire,
}

pub fn classify(entry: &EntryInfo, policy: &RetentionPolicy, now: SystemTime) -> Verdict {
    if policy.is_sentinel(&entry.name) {
        Verdict::Sentinel
    } else if !entry.is_file {
        Verdict::NotAFile
    } else if policy.is_expired(entry.changed, now) {
        Verdict::Expire
    } else {
        Verdict::Retain
    }
}

/// Entries the sweep deletes, independent of listing order.
pub fn select_expired<'a>(
    entries: &'a [EntryInfo],
    policy: &RetentionPolicy,
    now: SystemTime,
) -> Vec<&'a EntryInfo> {
    entries
        .iter()
        .filter(|entry| classify(entry, policy, now) == Verdict::Expire)
        .collect()
}

/// Deletes regular files in `dir` whose change time is older than the retention window.
///
/// Runs in two passes: every entry is stat'ed, then the entries picked by
/// [`select_expired`] are removed. Only a failure to list the directory is
/// returned. Stat and delete errors are recorded per entry in the report and do
/// not stop the remaining entries. At most `concurrency` filesystem calls run at once.
pub async fn sweep(
    dir: &Path,
    policy: &RetentionPolicy,
    now: SystemTime,
    concurrency: usize,
) -> Result<SweepReport, SweepError> {
    let read_dir_err = |source| SweepError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    };

    info!("🔍 Sweeping {} (window: {} days)", dir.display(), policy.window.as_secs() / 86_400);
    let mut listing = fs::read_dir(dir).await.map_err(read_dir_err)?;

    let limiter = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut report = SweepReport::default();

    let mut stats = JoinSet::new();
    while let Some(entry) = listing.next_entry().await.map_err(read_dir_err)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();

        if policy.is_sentinel(&name) {
            debug!("Skipping sentinel entry {}", path.display());
            report.skipped.push(path);
            continue;
        }

        let limiter = Arc::clone(&limiter);
        stats.spawn(async move {
            let _permit = limiter.acquire_owned().await.ok();
            stat_entry(path, name).await
        });
    }

    let mut entries = Vec::new();
    while let Some(joined) = stats.join_next().await {
        match joined {
            Ok(Ok(info)) => entries.push(info),
            Ok(Err(failure)) => report.failures.push(failure),
            Err(e) => warn!("⚠️ Sweep task for one entry did not complete: {}", e),
        }
    }

    for info in &entries {
        match classify(info, policy, now) {
            Verdict::Sentinel | Verdict::NotAFile => report.skipped.push(info.path.clone()),
            Verdict::Retain => report.retained.push(info.path.clone()),
            Verdict::Expire => {}
        }
    }
    delete_expired(&select_expired(&entries, policy, now), &limiter, &mut report).await;

    report.deleted.sort();
    report.retained.sort();
    report.skipped.sort();
    Ok(report)
}

async fn stat_entry(path: PathBuf, name: String) -> Result<EntryInfo, SweepEntryFailure> {
    // Follows symlinks, so a dangling link is a stat failure.
    let stat = match fs::metadata(&path).await {
        Ok(metadata) => change_time(&metadata).map(|changed| (metadata.is_file(), changed)),
        Err(e) => Err(e),
    };
    let (is_file, changed) = stat.map_err(|source| failed(path.clone(), SweepOp::Stat, source))?;

    debug!(path = %path.display(), is_file, changed = ?changed, "stat");
    Ok(EntryInfo {
        path,
        name,
        is_file,
        changed,
    })
}

/// Removes every entry in `expired`; a failed removal is recorded and the rest continue.
async fn delete_expired(expired: &[&EntryInfo], limiter: &Arc<Semaphore>, report: &mut SweepReport) {
    let mut deletions = JoinSet::new();
    for info in expired {
        let limiter = Arc::clone(limiter);
        let path = info.path.clone();
        let name = info.name.clone();
        deletions.spawn(async move {
            let _permit = limiter.acquire_owned().await.ok();
            delete_entry(path, name).await
        });
    }

    while let Some(joined) = deletions.join_next().await {
        match joined {
            Ok(Ok(path)) => report.deleted.push(path),
            Ok(Err(failure)) => report.failures.push(failure),
            Err(e) => warn!("⚠️ Sweep task for one entry did not complete: {}", e),
        }
    }
}

async fn delete_entry(path: PathBuf, name: String) -> Result<PathBuf, SweepEntryFailure> {
    match fs::remove_file(&path).await {
        Ok(()) => {
            info!("🗑️ Deleted file: {}", name);
            Ok(path)
        }
        Err(source) => Err(failed(path, SweepOp::Delete, source)),
    }
}

fn failed(path: PathBuf, op: SweepOp, source: io::Error) -> SweepEntryFailure {
    let failure = SweepEntryFailure { path, op, source };
    warn!("⚠️ {}", failure);
    failure
}
