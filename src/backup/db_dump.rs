// dbsnapshot/src/backup/db_dump.rs
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{ConnectionParams, DumpConfig};
use crate::errors::DumpError;
use crate::utils::find_mysqldump_executable;
use crate::utils::setting::check_db_connection;

/// Produces a complete SQL dump of one database at `output`.
#[async_trait]
pub trait DumpProvider: Send + Sync {
    async fn dump(&self, conn: &ConnectionParams, output: &Path) -> Result<(), DumpError>;
}

/// Shells out to the `mysqldump` client.
pub struct MysqlDumpProvider {
    executable: Option<PathBuf>,
    preflight: bool,
}

impl MysqlDumpProvider {
    pub fn new(config: &DumpConfig) -> Self {
        Self {
            executable: config.mysqldump_path.clone(),
            preflight: config.preflight,
        }
    }

    fn resolve_executable(&self) -> Result<PathBuf, DumpError> {
        match &self.executable {
            Some(path) => Ok(path.clone()),
            None => find_mysqldump_executable(),
        }
    }

    // The password goes through MYSQL_PWD so it never shows up in the process list.
    fn build_command(program: &Path, conn: &ConnectionParams, output: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg(format!("--host={}", conn.host))
            .arg(format!("--port={}", conn.port))
            .arg(format!("--user={}", conn.user))
            .arg("--single-transaction")
            .arg(format!("--result-file={}", output.display()))
            .arg(&conn.database)
            .env("MYSQL_PWD", &conn.password)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl DumpProvider for MysqlDumpProvider {
    async fn dump(&self, conn: &ConnectionParams, output: &Path) -> Result<(), DumpError> {
        if self.preflight {
            check_db_connection(conn).await?;
        }

        let program = self.resolve_executable()?;
        debug!("Using mysqldump executable at: {}", program.display());

        info!(
            "Dumping database {} from {} to {}...",
            conn.database,
            conn.host,
            output.display()
        );
        let result = Self::build_command(&program, conn, output)
            .output()
            .await
            .map_err(|source| DumpError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(DumpError::Provider {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
