use async_trait::async_trait;
use interview_core::model::{CandidateId, CompletedInterview, Session, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Row counts of both partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub in_progress: usize,
    pub completed: usize,
}

impl StoreCounts {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_progress == 0 && self.completed == 0
    }
}

/// Full contents of a store, used for bulk restore and the mirror file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub sessions: Vec<Session>,
    pub completed: Vec<CompletedInterview>,
}

/// Repository contract for interview sessions.
///
/// In-progress sessions are keyed by session id; completed interviews are
/// keyed by candidate id. A session is never present in both partitions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace an in-progress session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn put(&self, session: &Session) -> Result<(), StorageError>;

    /// All in-progress sessions, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the sessions cannot be read.
    async fn get_all(&self) -> Result<Vec<Session>, StorageError>;

    /// Fetch one in-progress session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_by_id(&self, id: &SessionId) -> Result<Session, StorageError>;

    /// Remove an in-progress session. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn remove(&self, id: &SessionId) -> Result<bool, StorageError>;

    /// Atomically drop `id` from the in-progress partition and store the
    /// completed record, replacing any earlier record for the candidate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the move fails; nothing is changed then.
    async fn move_to_completed(
        &self,
        id: &SessionId,
        completed: &CompletedInterview,
    ) -> Result<(), StorageError>;

    /// All completed interviews, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the records cannot be read.
    async fn list_completed(&self) -> Result<Vec<CompletedInterview>, StorageError>;

    /// Fetch the completed interview of one candidate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_completed(
        &self,
        candidate_id: CandidateId,
    ) -> Result<CompletedInterview, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the counts cannot be read.
    async fn counts(&self) -> Result<StoreCounts, StorageError>;

    /// Bulk upsert of both partitions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any record cannot be stored.
    async fn restore(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct Partitions {
    sessions: HashMap<SessionId, Session>,
    completed: HashMap<CandidateId, CompletedInterview>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Both partitions sit behind one lock so `move_to_completed` is atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Mutex<Partitions>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Partitions>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for InMemoryRepository {
    async fn put(&self, session: &Session) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.sessions.insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Session>, StorageError> {
        let guard = self.lock()?;
        let mut sessions: Vec<Session> = guard.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| {
            b.last_activity_at()
                .cmp(&a.last_activity_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(sessions)
    }

    async fn get_by_id(&self, id: &SessionId) -> Result<Session, StorageError> {
        let guard = self.lock()?;
        guard.sessions.get(id).cloned().ok_or(StorageError::NotFound)
    }

    async fn remove(&self, id: &SessionId) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        Ok(guard.sessions.remove(id).is_some())
    }

    async fn move_to_completed(
        &self,
        id: &SessionId,
        completed: &CompletedInterview,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.sessions.remove(id);
        guard
            .completed
            .insert(completed.candidate.id, completed.clone());
        Ok(())
    }

    async fn list_completed(&self) -> Result<Vec<CompletedInterview>, StorageError> {
        let guard = self.lock()?;
        let mut completed: Vec<CompletedInterview> = guard.completed.values().cloned().collect();
        completed.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(completed)
    }

    async fn get_completed(
        &self,
        candidate_id: CandidateId,
    ) -> Result<CompletedInterview, StorageError> {
        let guard = self.lock()?;
        guard
            .completed
            .get(&candidate_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn counts(&self) -> Result<StoreCounts, StorageError> {
        let guard = self.lock()?;
        Ok(StoreCounts {
            in_progress: guard.sessions.len(),
            completed: guard.completed.len(),
        })
    }

    async fn restore(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        for session in &snapshot.sessions {
            guard.sessions.insert(session.id().clone(), session.clone());
        }
        for record in &snapshot.completed {
            guard.completed.insert(record.candidate.id, record.clone());
        }
        Ok(())
    }
}

/// Aggregates the session store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemoryRepository::new());
        Self { sessions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::model::{
        Difficulty, GeneratedQuestion, ResumeAnalysis, SubmitKind,
    };
    use interview_core::time::fixed_now;

    fn completed_session() -> Session {
        let now = fixed_now();
        let mut s = Session::create(now);
        s.apply_resume_analysis(
            CandidateId::generate(),
            ResumeAnalysis {
                name: Some("Ada".into()),
                email: Some("ada@example.com".into()),
                phone: Some("555-123-4567".into()),
                ..ResumeAnalysis::default()
            },
            "cv.txt",
            now,
        )
        .unwrap();
        s.set_questions(vec![GeneratedQuestion::new("q", Difficulty::Easy)], now)
            .unwrap();
        s.start_interview(now).unwrap();
        s.reveal_current(now).unwrap();
        s.begin_countdown(now).unwrap();
        s.submit("answer", SubmitKind::Manual, now).unwrap();
        s.finish("done", now).unwrap();
        s
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let repo = InMemoryRepository::new();
        let session = Session::create(fixed_now());
        repo.put(&session).await.unwrap();

        let fetched = repo.get_by_id(session.id()).await.unwrap();
        assert_eq!(fetched, session);
        assert!(repo.remove(session.id()).await.unwrap());
        assert!(!repo.remove(session.id()).await.unwrap());
        assert!(matches!(
            repo.get_by_id(session.id()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn move_to_completed_switches_partition() {
        let repo = InMemoryRepository::new();
        let session = completed_session();
        repo.put(&session).await.unwrap();

        let record = session.to_completed(fixed_now()).unwrap();
        repo.move_to_completed(session.id(), &record).await.unwrap();

        let counts = repo.counts().await.unwrap();
        assert_eq!(counts, StoreCounts { in_progress: 0, completed: 1 });
        let fetched = repo.get_completed(record.candidate.id).await.unwrap();
        assert_eq!(fetched.session_id, *session.id());
    }
}
