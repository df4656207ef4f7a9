use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tracing;

const JOKES_TABLE: &str = "jokes";

/// Opens a SQLite pool for `database_url`.
///
/// In-memory databases live only as long as their connection, so their
/// connections are never recycled.
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Startup: Invalid database URL '{}'", database_url))?
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
    if database_url.contains(":memory:") {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("Startup: Failed to connect to database '{}'", database_url))?;
    tracing::info!(max_connections, "Startup: Database pool ready");
    Ok(pool)
}

/// Creates the jokes table and its unique date index if they do not exist.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS jokes (
            id          TEXT PRIMARY KEY NOT NULL,
            date        TEXT NOT NULL,
            joke        TEXT NOT NULL CHECK (length(trim(joke)) > 0),
            description TEXT
        )",
    )
    .execute(pool)
    .await
    .with_context(|| format!("Startup: Failed to create table '{}'", JOKES_TABLE))?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS jokes_date_key ON jokes (date)")
        .execute(pool)
        .await
        .with_context(|| format!("Startup: Failed to create date index on '{}'", JOKES_TABLE))?;

    tracing::info!("Startup: Table '{}' is ready.", JOKES_TABLE);
    Ok(())
}

/// Resolves when the process receives Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
