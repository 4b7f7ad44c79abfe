pub mod setting;

use std::fs::Metadata;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;
use which::which;

use crate::errors::DumpError;

/// Finds the mysqldump executable in the system PATH.
pub fn find_mysqldump_executable() -> Result<PathBuf, DumpError> {
    which("mysqldump").map_err(|e| {
        DumpError::ExecutableNotFound(format!(
            "{}. Please ensure MySQL client tools are installed and in your PATH, or set MYSQLDUMP_PATH.",
            e
        ))
    })
}

/// Inode change time (ctime). Used both to stamp new artifacts and to age them out.
#[cfg(unix)]
pub fn change_time(metadata: &Metadata) -> io::Result<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    use std::time::{Duration, UNIX_EPOCH};

    let secs = metadata.ctime();
    let nanos = Duration::from_nanos(metadata.ctime_nsec().max(0) as u64);
    let base = if secs >= 0 {
        UNIX_EPOCH.checked_add(Duration::from_secs(secs as u64))
    } else {
        UNIX_EPOCH.checked_sub(Duration::from_secs(secs.unsigned_abs()))
    };
    base.and_then(|t| t.checked_add(nanos))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "change time out of range"))
}

#[cfg(not(unix))]
pub fn change_time(metadata: &Metadata) -> io::Result<SystemTime> {
    metadata.created().or_else(|_| metadata.modified())
}
