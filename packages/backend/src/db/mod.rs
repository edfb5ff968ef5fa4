//! Connection setup for the SQL-backed state store.

mod schema;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};
use thiserror::Error;

pub use schema::{split_sql_statements, SCHEMA_SQL};

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("DATABASE_URL is not set")]
    MissingUrl,
    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Default SQLite file under the platform's local data directory.
pub fn default_sqlite_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gateprep")
        .join("state.db")
}

pub async fn connect_postgres(url: &str) -> Result<PgPool, DbInitError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;

    for stmt in split_sql_statements(SCHEMA_SQL) {
        sqlx::query(&stmt).execute(&pool).await?;
    }
    tracing::info!("postgres state store ready");
    Ok(pool)
}

pub async fn connect_sqlite(path: &Path) -> Result<SqlitePool, DbInitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    for stmt in split_sql_statements(SCHEMA_SQL) {
        sqlx::query(&stmt).execute(&pool).await?;
    }
    tracing::info!(path = %path.display(), "sqlite state store ready");
    Ok(pool)
}
