//! `SQLite` backend: one pool holding the in-progress and completed
//! partitions as JSON payloads plus the columns the dashboard sorts on.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;
use tracing::debug;

use crate::repository::{SessionStore, Storage};

mod mapping;
mod migrate;
mod session_repo;

pub use migrate::SCHEMA_VERSION;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("database has schema version {found}, expected {expected}")]
    SchemaMismatch { found: i64, expected: i64 },
}

impl SqliteRepository {
    /// Open a pool on `database_url`, creating the file if needed. File
    /// databases run in WAL mode.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is malformed or the pool cannot
    /// connect.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(BUSY_TIMEOUT)
            .connect_with(options)
            .await?;
        debug!(url = database_url, "sqlite pool ready");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the schema if this database has none; refuse any other version.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail or the database
    /// carries a different schema version.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await?;
        match self.schema_version().await? {
            Some(SCHEMA_VERSION) | None => Ok(()),
            Some(found) => Err(SqliteInitError::SchemaMismatch {
                found,
                expected: SCHEMA_VERSION,
            }),
        }
    }

    /// Highest applied schema version, if any.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the migrations table cannot be read.
    pub async fn schema_version(&self) -> Result<Option<i64>, SqliteInitError> {
        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }
}

impl Storage {
    /// Session storage backed by `SQLite`, migrated and ready.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let sessions: Arc<dyn SessionStore> = Arc::new(repo);
        Ok(Self { sessions })
    }
}
