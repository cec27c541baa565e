use interview_core::model::{CandidateId, CompletedInterview, IdentityField, Session, SessionId};
use sqlx::{Row, SqliteConnection};

use super::{
    SqliteRepository,
    mapping::{conn, count_from_i64, encode_payload, map_completed_row, map_session_row},
};
use crate::repository::{SessionStore, StorageError, StoreCounts, StoreSnapshot};

async fn upsert_session(db: &mut SqliteConnection, session: &Session) -> Result<(), StorageError> {
    let payload = encode_payload(session)?;
    let candidate = session.candidate();
    sqlx::query(
        r"
            INSERT INTO in_progress_sessions (
                session_id, candidate_name, candidate_email, stage, status,
                started_at, last_activity_at, payload
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(session_id) DO UPDATE SET
                candidate_name = excluded.candidate_name,
                candidate_email = excluded.candidate_email,
                stage = excluded.stage,
                status = excluded.status,
                started_at = excluded.started_at,
                last_activity_at = excluded.last_activity_at,
                payload = excluded.payload
        ",
    )
    .bind(session.id().as_str())
    .bind(candidate.and_then(|c| c.field(IdentityField::Name)))
    .bind(candidate.and_then(|c| c.field(IdentityField::Email)))
    .bind(session.stage().as_str())
    .bind(session.status().as_str())
    .bind(session.started_at())
    .bind(session.last_activity_at())
    .bind(payload)
    .execute(&mut *db)
    .await
    .map_err(conn)?;
    Ok(())
}

async fn upsert_completed(
    db: &mut SqliteConnection,
    record: &CompletedInterview,
) -> Result<(), StorageError> {
    let payload = encode_payload(record)?;
    sqlx::query(
        r"
            INSERT INTO completed_interviews (
                candidate_id, session_id, candidate_name, candidate_email,
                final_score, completed_at, payload
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(candidate_id) DO UPDATE SET
                session_id = excluded.session_id,
                candidate_name = excluded.candidate_name,
                candidate_email = excluded.candidate_email,
                final_score = excluded.final_score,
                completed_at = excluded.completed_at,
                payload = excluded.payload
        ",
    )
    .bind(record.candidate.id.to_string())
    .bind(record.session_id.as_str())
    .bind(record.candidate.field(IdentityField::Name))
    .bind(record.candidate.field(IdentityField::Email))
    .bind(i64::from(record.final_score.value()))
    .bind(record.completed_at)
    .bind(payload)
    .execute(&mut *db)
    .await
    .map_err(conn)?;
    Ok(())
}

#[async_trait::async_trait]
impl SessionStore for SqliteRepository {
    async fn put(&self, session: &Session) -> Result<(), StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        upsert_session(&mut db, session).await
    }

    async fn get_all(&self) -> Result<Vec<Session>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT session_id, payload
                FROM in_progress_sessions
                ORDER BY last_activity_at DESC, session_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_session_row).collect()
    }

    async fn get_by_id(&self, id: &SessionId) -> Result<Session, StorageError> {
        let row = sqlx::query(
            r"
                SELECT session_id, payload
                FROM in_progress_sessions
                WHERE session_id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_session_row(&row)
    }

    async fn remove(&self, id: &SessionId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM in_progress_sessions WHERE session_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }

    async fn move_to_completed(
        &self,
        id: &SessionId,
        completed: &CompletedInterview,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM in_progress_sessions WHERE session_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        upsert_completed(&mut tx, completed).await?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn list_completed(&self) -> Result<Vec<CompletedInterview>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT candidate_id, payload
                FROM completed_interviews
                ORDER BY completed_at DESC, session_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_completed_row).collect()
    }

    async fn get_completed(
        &self,
        candidate_id: CandidateId,
    ) -> Result<CompletedInterview, StorageError> {
        let row = sqlx::query(
            r"
                SELECT candidate_id, payload
                FROM completed_interviews
                WHERE candidate_id = ?1
            ",
        )
        .bind(candidate_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_completed_row(&row)
    }

    async fn counts(&self) -> Result<StoreCounts, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    (SELECT COUNT(*) FROM in_progress_sessions) AS in_progress,
                    (SELECT COUNT(*) FROM completed_interviews) AS completed
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        Ok(StoreCounts {
            in_progress: count_from_i64(
                "in_progress",
                row.try_get::<i64, _>("in_progress").map_err(conn)?,
            )?,
            completed: count_from_i64(
                "completed",
                row.try_get::<i64, _>("completed").map_err(conn)?,
            )?,
        })
    }

    async fn restore(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for session in &snapshot.sessions {
            upsert_session(&mut tx, session).await?;
        }
        for record in &snapshot.completed {
            upsert_completed(&mut tx, record).await?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
