// Database connectivity check
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, info};

use crate::config::ConnectionParams;
use crate::errors::DumpError;

fn connect_options(params: &ConnectionParams) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&params.host)
        .port(params.port)
        .username(&params.user)
        .password(&params.password)
        .database(&params.database)
}

/// Opens and closes one connection so auth and network problems surface before the dump starts.
pub async fn check_db_connection(params: &ConnectionParams) -> Result<(), DumpError> {
    let conn = connect_options(params)
        .connect()
        .await
        .map_err(|e| DumpError::Connection(e.to_string()))?;
    if let Err(e) = conn.close().await {
        debug!("Closing pre-flight connection failed: {}", e);
    }
    info!(
        "✅ Successfully connected to {}:{}/{}",
        params.host, params.port, params.database
    );
    Ok(())
}
