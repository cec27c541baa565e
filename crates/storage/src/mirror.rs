//! Secondary copy of the session store kept in a single JSON file.
//!
//! The mirror is written on every store mutation and read only at boot, to
//! refill a primary store that lost its data.

use async_trait::async_trait;
use fs_err as fs;
use interview_core::model::{CandidateId, CompletedInterview, Session, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

use crate::repository::{SessionStore, Storage, StorageError, StoreCounts, StoreSnapshot};

pub const MIRROR_VERSION: u32 = 1;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MirrorError {
    #[error("mirror file io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("mirror file is not valid json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported mirror version {found}")]
    UnsupportedVersion { found: u32 },
}

impl From<MirrorError> for StorageError {
    fn from(e: MirrorError) -> Self {
        match e {
            MirrorError::Io(e) => StorageError::Connection(e.to_string()),
            other => StorageError::Serialization(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MirrorDocument {
    version: u32,
    #[serde(flatten)]
    snapshot: StoreSnapshot,
}

//
// ─── JSON FILE MIRROR ──────────────────────────────────────────────────────────
//

/// Whole-document JSON store, rewritten atomically (temp file + rename).
#[derive(Clone)]
pub struct JsonFileMirror {
    path: PathBuf,
    state: Arc<Mutex<StoreSnapshot>>,
}

impl JsonFileMirror {
    /// Opens the mirror at `path`; a missing file is an empty mirror.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError` if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MirrorError> {
        let path = path.into();
        let snapshot = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let doc: MirrorDocument = serde_json::from_str(&raw)?;
            if doc.version != MIRROR_VERSION {
                return Err(MirrorError::UnsupportedVersion { found: doc.version });
            }
            doc.snapshot
        } else {
            StoreSnapshot::default()
        };
        Ok(Self {
            path,
            state: Arc::new(Mutex::new(snapshot)),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update<R>(
        &self,
        apply: impl FnOnce(&mut StoreSnapshot) -> R,
    ) -> Result<R, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let out = apply(&mut guard);
        write_atomically(&self.path, &guard)?;
        Ok(out)
    }

    fn read<R>(&self, view: impl FnOnce(&StoreSnapshot) -> R) -> Result<R, StorageError> {
        let guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(view(&guard))
    }
}

fn write_atomically(path: &Path, snapshot: &StoreSnapshot) -> Result<(), MirrorError> {
    let doc = MirrorDocument {
        version: MIRROR_VERSION,
        snapshot: snapshot.clone(),
    };
    let body = serde_json::to_vec_pretty(&doc)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(&body)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn upsert_session(snapshot: &mut StoreSnapshot, session: &Session) {
    match snapshot.sessions.iter_mut().find(|s| s.id() == session.id()) {
        Some(slot) => *slot = session.clone(),
        None => snapshot.sessions.push(session.clone()),
    }
}

fn upsert_completed(snapshot: &mut StoreSnapshot, record: &CompletedInterview) {
    match snapshot
        .completed
        .iter_mut()
        .find(|c| c.candidate.id == record.candidate.id)
    {
        Some(slot) => *slot = record.clone(),
        None => snapshot.completed.push(record.clone()),
    }
}

#[async_trait]
impl SessionStore for JsonFileMirror {
    async fn put(&self, session: &Session) -> Result<(), StorageError> {
        self.update(|s| upsert_session(s, session))
    }

    async fn get_all(&self) -> Result<Vec<Session>, StorageError> {
        self.read(|s| {
            let mut sessions = s.sessions.clone();
            sessions.sort_by(|a, b| b.last_activity_at().cmp(&a.last_activity_at()));
            sessions
        })
    }

    async fn get_by_id(&self, id: &SessionId) -> Result<Session, StorageError> {
        self.read(|s| s.sessions.iter().find(|x| x.id() == id).cloned())?
            .ok_or(StorageError::NotFound)
    }

    async fn remove(&self, id: &SessionId) -> Result<bool, StorageError> {
        self.update(|s| {
            let before = s.sessions.len();
            s.sessions.retain(|x| x.id() != id);
            s.sessions.len() != before
        })
    }

    async fn move_to_completed(
        &self,
        id: &SessionId,
        completed: &CompletedInterview,
    ) -> Result<(), StorageError> {
        self.update(|s| {
            s.sessions.retain(|x| x.id() != id);
            upsert_completed(s, completed);
        })
    }

    async fn list_completed(&self) -> Result<Vec<CompletedInterview>, StorageError> {
        self.read(|s| {
            let mut completed = s.completed.clone();
            completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
            completed
        })
    }

    async fn get_completed(
        &self,
        candidate_id: CandidateId,
    ) -> Result<CompletedInterview, StorageError> {
        self.read(|s| {
            s.completed
                .iter()
                .find(|c| c.candidate.id == candidate_id)
                .cloned()
        })?
        .ok_or(StorageError::NotFound)
    }

    async fn counts(&self) -> Result<StoreCounts, StorageError> {
        self.read(|s| StoreCounts {
            in_progress: s.sessions.len(),
            completed: s.completed.len(),
        })
    }

    async fn restore(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError> {
        self.update(|s| {
            for session in &snapshot.sessions {
                upsert_session(s, session);
            }
            for record in &snapshot.completed {
                upsert_completed(s, record);
            }
        })
    }
}

//
// ─── WRITE-THROUGH STORE ───────────────────────────────────────────────────────
//

/// How many records `restore_from_mirror` copied into the primary store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub sessions_restored: usize,
    pub completed_restored: usize,
}

/// Writes go to the primary store, then the mirror; reads come from the
/// primary. Mirror failures are logged and never surfaced.
#[derive(Clone)]
pub struct MirroredStore {
    primary: Arc<dyn SessionStore>,
    mirror: Arc<dyn SessionStore>,
}

impl MirroredStore {
    #[must_use]
    pub fn new(primary: Arc<dyn SessionStore>, mirror: Arc<dyn SessionStore>) -> Self {
        Self { primary, mirror }
    }

    /// Fills every empty primary partition from the mirror.
    ///
    /// In-progress sessions that the primary already holds as completed are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the primary cannot be read or written.
    pub async fn restore_from_mirror(&self) -> Result<RestoreReport, StorageError> {
        let counts = self.primary.counts().await?;
        if counts.in_progress > 0 && counts.completed > 0 {
            return Ok(RestoreReport::default());
        }

        let mut snapshot = StoreSnapshot::default();
        if counts.completed == 0 {
            snapshot.completed = self.mirror.list_completed().await?;
        }
        if counts.in_progress == 0 {
            let completed_ids: HashSet<SessionId> = if counts.completed == 0 {
                snapshot
                    .completed
                    .iter()
                    .map(|c| c.session_id.clone())
                    .collect()
            } else {
                self.primary
                    .list_completed()
                    .await?
                    .into_iter()
                    .map(|c| c.session_id)
                    .collect()
            };
            snapshot.sessions = self
                .mirror
                .get_all()
                .await?
                .into_iter()
                .filter(|s| !completed_ids.contains(s.id()))
                .collect();
        }

        let report = RestoreReport {
            sessions_restored: snapshot.sessions.len(),
            completed_restored: snapshot.completed.len(),
        };
        if report.sessions_restored + report.completed_restored > 0 {
            self.primary.restore(&snapshot).await?;
            info!(
                sessions = report.sessions_restored,
                completed = report.completed_restored,
                "restored session store from mirror"
            );
        }
        Ok(report)
    }

    fn mirror_failed(op: &'static str, e: &StorageError) {
        warn!(op, error = %e, "mirror write failed; primary store is still authoritative");
    }
}

#[async_trait]
impl SessionStore for MirroredStore {
    async fn put(&self, session: &Session) -> Result<(), StorageError> {
        self.primary.put(session).await?;
        if let Err(e) = self.mirror.put(session).await {
            Self::mirror_failed("put", &e);
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Session>, StorageError> {
        self.primary.get_all().await
    }

    async fn get_by_id(&self, id: &SessionId) -> Result<Session, StorageError> {
        self.primary.get_by_id(id).await
    }

    async fn remove(&self, id: &SessionId) -> Result<bool, StorageError> {
        let removed = self.primary.remove(id).await?;
        if let Err(e) = self.mirror.remove(id).await {
            Self::mirror_failed("remove", &e);
        }
        Ok(removed)
    }

    async fn move_to_completed(
        &self,
        id: &SessionId,
        completed: &CompletedInterview,
    ) -> Result<(), StorageError> {
        self.primary.move_to_completed(id, completed).await?;
        if let Err(e) = self.mirror.move_to_completed(id, completed).await {
            Self::mirror_failed("move_to_completed", &e);
        }
        Ok(())
    }

    async fn list_completed(&self) -> Result<Vec<CompletedInterview>, StorageError> {
        self.primary.list_completed().await
    }

    async fn get_completed(
        &self,
        candidate_id: CandidateId,
    ) -> Result<CompletedInterview, StorageError> {
        self.primary.get_completed(candidate_id).await
    }

    async fn counts(&self) -> Result<StoreCounts, StorageError> {
        self.primary.counts().await
    }

    async fn restore(&self, snapshot: &StoreSnapshot) -> Result<(), StorageError> {
        self.primary.restore(snapshot).await?;
        if let Err(e) = self.mirror.restore(snapshot).await {
            Self::mirror_failed("restore", &e);
        }
        Ok(())
    }
}

impl Storage {
    /// Wraps this storage in a write-through mirror and repairs empty
    /// partitions from it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the repair cannot read or write the primary.
    pub async fn with_mirror(
        self,
        mirror: JsonFileMirror,
    ) -> Result<(Self, RestoreReport), StorageError> {
        let store = MirroredStore::new(self.sessions, Arc::new(mirror));
        let report = store.restore_from_mirror().await?;
        let sessions: Arc<dyn SessionStore> = Arc::new(store);
        Ok((Self { sessions }, report))
    }
}
