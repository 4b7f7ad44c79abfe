// dbsnapshot/src/config/mod.rs
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::retention::RetentionPolicy;

const DEFAULT_DB_PORT: u16 = 3306;
const DEFAULT_RETENTION_DAYS: u64 = 30;
const DEFAULT_SENTINEL: &str = ".gitkeep";
const DEFAULT_SWEEP_CONCURRENCY: usize = 16;
const DEFAULT_SWEEP_GRACE_SECS: u64 = 30;
pub const DEFAULT_SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Connection parameters handed to the dump provider.
#[derive(Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub backup_dir: PathBuf,
    pub retention: RetentionPolicy,
    pub sweep_concurrency: usize,
    pub sweep_grace: Duration,
}

#[derive(Debug, Clone)]
pub struct DumpConfig {
    /// Explicit mysqldump location; looked up on PATH when absent.
    pub mysqldump_path: Option<PathBuf>,
    pub preflight: bool,
}

#[derive(Clone)]
pub struct NotificationConfig {
    pub api_key: String,
    pub endpoint: String,
    pub from_email: String,
    pub to_email: String,
}

impl fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .finish()
    }
}

/// Immutable settings for one invocation, built once in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backup: BackupConfig,
    pub database: ConnectionParams,
    pub dump: DumpConfig,
    pub notification: NotificationConfig,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    /// `.env` should already have been loaded by the caller.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backup_dir = PathBuf::from(required(&lookup, "BACKUP_DIR")?);

        let retention_days: u64 = optional_parsed(&lookup, "RETENTION_DAYS", DEFAULT_RETENTION_DAYS)?;
        let sentinel = optional(&lookup, "BACKUP_SENTINEL")
            .unwrap_or_else(|| DEFAULT_SENTINEL.to_string());
        let sweep_concurrency: usize =
            optional_parsed(&lookup, "SWEEP_CONCURRENCY", DEFAULT_SWEEP_CONCURRENCY)?;
        if sweep_concurrency == 0 {
            anyhow::bail!("SWEEP_CONCURRENCY must be at least 1");
        }
        let sweep_grace_secs: u64 =
            optional_parsed(&lookup, "SWEEP_GRACE_SECS", DEFAULT_SWEEP_GRACE_SECS)?;

        let database = ConnectionParams {
            host: required(&lookup, "REMOTE_HOST")?,
            port: optional_parsed(&lookup, "DB_PORT", DEFAULT_DB_PORT)?,
            user: required(&lookup, "DB_USER")?,
            password: required_raw(&lookup, "DB_PASSWORD")?,
            database: required(&lookup, "DB_NAME")?,
        };

        let dump = DumpConfig {
            mysqldump_path: optional(&lookup, "MYSQLDUMP_PATH").map(PathBuf::from),
            preflight: parse_flag(&lookup, "DB_PREFLIGHT", true)?,
        };

        let notification = NotificationConfig {
            api_key: required_raw(&lookup, "SENDGRID_API_KEY")?,
            endpoint: optional(&lookup, "SENDGRID_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_SENDGRID_ENDPOINT.to_string()),
            from_email: required(&lookup, "FROM_EMAIL")?,
            to_email: required(&lookup, "TO_EMAIL")?,
        };

        Ok(AppConfig {
            backup: BackupConfig {
                backup_dir,
                retention: RetentionPolicy::from_days(retention_days).with_sentinel(sentinel),
                sweep_concurrency,
                sweep_grace: Duration::from_secs(sweep_grace_secs),
            },
            database,
            dump,
            notification,
        })
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).with_context(|| format!("{} must be set and cannot be empty", key))
}

/// Secrets are passed through untouched; only an empty value is rejected.
fn required_raw<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .with_context(|| format!("{} must be set and cannot be empty", key))
}

fn optional_parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match optional(lookup, key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow::anyhow!("{} must be a boolean, got {:?}", key, v)),
        },
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("BACKUP_DIR", "/var/backups/mysql"),
            ("REMOTE_HOST", "db.internal"),
            ("DB_USER", "backup"),
            ("DB_PASSWORD", "s3cret"),
            ("DB_NAME", "shop"),
            ("SENDGRID_API_KEY", "SG.key"),
            ("FROM_EMAIL", "backups@example.com"),
            ("TO_EMAIL", "ops@example.com"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig> {
        AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() -> anyhow::Result<()> {
        let config = load(&base_env())?;

        assert_eq!(config.backup.backup_dir, PathBuf::from("/var/backups/mysql"));
        assert_eq!(config.backup.retention.window, Duration::from_secs(30 * 86_400));
        assert_eq!(config.backup.retention.sentinel, ".gitkeep");
        assert_eq!(config.backup.sweep_concurrency, 16);
        assert_eq!(config.backup.sweep_grace, Duration::from_secs(30));
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.notification.endpoint, DEFAULT_SENDGRID_ENDPOINT);
        assert!(config.dump.mysqldump_path.is_none());
        assert!(config.dump.preflight);
        Ok(())
    }

    #[test]
    fn test_overrides() -> anyhow::Result<()> {
        let mut vars = base_env();
        vars.insert("RETENTION_DAYS", "7");
        vars.insert("DB_PORT", "3307");
        vars.insert("BACKUP_SENTINEL", ".keep");
        vars.insert("DB_PREFLIGHT", "off");
        vars.insert("MYSQLDUMP_PATH", "/opt/mysql/bin/mysqldump");

        let config = load(&vars)?;
        assert_eq!(config.backup.retention.window, Duration::from_secs(7 * 86_400));
        assert_eq!(config.backup.retention.sentinel, ".keep");
        assert_eq!(config.database.port, 3307);
        assert!(!config.dump.preflight);
        assert_eq!(
            config.dump.mysqldump_path,
            Some(PathBuf::from("/opt/mysql/bin/mysqldump"))
        );
        Ok(())
    }

    #[test]
    fn test_missing_required_value() {
        let mut vars = base_env();
        vars.remove("DB_NAME");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("DB_NAME"));
    }

    #[test]
    fn test_blank_value_treated_as_missing() {
        let mut vars = base_env();
        vars.insert("BACKUP_DIR", "   ");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_secrets_keep_surrounding_whitespace() -> anyhow::Result<()> {
        let mut vars = base_env();
        vars.insert("DB_PASSWORD", "  pass word  ");
        vars.insert("SENDGRID_API_KEY", " SG.key\t");

        let config = load(&vars)?;
        assert_eq!(config.database.password, "  pass word  ");
        assert_eq!(config.notification.api_key, " SG.key\t");
        Ok(())
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut vars = base_env();
        vars.insert("DB_PASSWORD", "");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("DB_PASSWORD"));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let mut vars = base_env();
        vars.insert("RETENTION_DAYS", "thirty");
        assert!(load(&vars).is_err());

        let mut vars = base_env();
        vars.insert("SWEEP_CONCURRENCY", "0");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() -> anyhow::Result<()> {
        let config = load(&base_env())?;
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("SG.key"));
        assert!(rendered.contains("db.internal"));
        Ok(())
    }
}
