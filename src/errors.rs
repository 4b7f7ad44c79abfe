// dbsnapshot/src/errors.rs
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Hard failure: the dump step did not produce an artifact.
#[derive(Error, Debug)]
pub enum DumpError {
    #[error("mysqldump executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("Failed to start dump provider {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dump provider exited with {status}: {stderr}")]
    Provider { status: ExitStatus, stderr: String },

    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Backup file already exists, refusing to overwrite: {}", .0.display())]
    ArtifactExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOp {
    Stat,
    Delete,
}

impl std::fmt::Display for SweepOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepOp::Stat => f.write_str("stat"),
            SweepOp::Delete => f.write_str("delete"),
        }
    }
}

/// Soft failure scoped to a single directory entry.
#[derive(Error, Debug)]
#[error("Failed to {op} {}: {source}", .path.display())]
pub struct SweepEntryFailure {
    pub path: PathBuf,
    pub op: SweepOp,
    #[source]
    pub source: std::io::Error,
}

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Failed to read backup directory {}: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sweep task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
