use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

pub const SCHEMA_VERSION: i64 = 1;

/// Creates the fixed schema: in-progress sessions, completed interviews and
/// their indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if is_applied(pool, SCHEMA_VERSION).await? {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS in_progress_sessions (
                session_id TEXT PRIMARY KEY,
                candidate_name TEXT,
                candidate_email TEXT,
                stage TEXT NOT NULL,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                last_activity_at TEXT NOT NULL,
                payload TEXT NOT NULL
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS completed_interviews (
                candidate_id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                candidate_name TEXT,
                candidate_email TEXT,
                final_score INTEGER NOT NULL CHECK (final_score BETWEEN 0 AND 100),
                completed_at TEXT NOT NULL,
                payload TEXT NOT NULL
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE INDEX IF NOT EXISTS idx_in_progress_last_activity
                ON in_progress_sessions (last_activity_at);
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE INDEX IF NOT EXISTS idx_completed_session
                ON completed_interviews (session_id);
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE INDEX IF NOT EXISTS idx_completed_completed_at
                ON completed_interviews (completed_at);
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(SCHEMA_VERSION)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(())
}
