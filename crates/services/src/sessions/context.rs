use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use interview_core::model::{CompletedInterview, ProgressFlags, Session, SessionStateError, TickOutcome};
use storage::repository::SessionStore;
use tracing::{debug, warn};

use crate::Clock;
use crate::error::SessionError;

/// Minimum spacing between saves of non-milestone changes.
pub const DEFAULT_SAVE_DEBOUNCE_MS: i64 = 500;

/// Owns the single active session and keeps the store in step with it.
///
/// Milestone changes (any progress flag) are saved immediately; everything
/// else is debounced and written on `flush`. Store failures are logged and
/// never reach the caller.
pub struct SessionContext {
    clock: Clock,
    store: Arc<dyn SessionStore>,
    session: Option<Session>,
    debounce: Duration,
    last_saved_at: Option<DateTime<Utc>>,
    dirty: bool,
}

impl SessionContext {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn SessionStore>) -> Self {
        Self {
            clock,
            store,
            session: None,
            debounce: Duration::milliseconds(DEFAULT_SAVE_DEBOUNCE_MS),
            last_saved_at: None,
            dirty: false,
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Moves a fixed clock forward; used by tests and replays.
    pub fn advance_clock(&mut self, delta: Duration) {
        self.clock.advance(delta);
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Makes `session` the active one and saves it.
    pub async fn install(&mut self, session: Session) {
        self.session = Some(session);
        self.save_now().await;
    }

    /// Applies a reducer to the active session and schedules persistence.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` without a session, or the
    /// reducer's own error. A failed reducer leaves nothing to save.
    pub async fn apply<R>(
        &mut self,
        reducer: impl FnOnce(&mut Session, DateTime<Utc>) -> Result<R, SessionStateError>,
    ) -> Result<R, SessionError> {
        let now = self.clock.now();
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        let before: ProgressFlags = session.progress();
        let out = reducer(session, now)?;
        let milestone = session.progress() != before;

        self.dirty = true;
        if milestone || self.debounce_elapsed(now) {
            self.save_now().await;
        }
        Ok(out)
    }

    /// One countdown second; not persisted on its own.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` without a session.
    pub fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        self.session
            .as_mut()
            .map(Session::tick)
            .ok_or(SessionError::NoActiveSession)
    }

    /// Writes pending changes, if any.
    pub async fn flush(&mut self) {
        if self.dirty {
            self.save_now().await;
        }
    }

    /// Moves the finished session to the completed partition.
    pub async fn archive(&mut self, record: &CompletedInterview) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match self.store.move_to_completed(session.id(), record).await {
            Ok(()) => {
                self.dirty = false;
                self.last_saved_at = Some(self.clock.now());
                debug!(session_id = %session.id(), "session archived");
            }
            Err(e) => warn!(session_id = %session.id(), error = %e, "archiving session failed"),
        }
    }

    /// Drops the active session from memory. Its stored record is untouched.
    pub fn reset(&mut self) -> Option<Session> {
        self.dirty = false;
        self.last_saved_at = None;
        self.session.take()
    }

    fn debounce_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.last_saved_at
            .is_none_or(|saved| now - saved >= self.debounce)
    }

    async fn save_now(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match self.store.put(session).await {
            Ok(()) => {
                self.dirty = false;
                self.last_saved_at = Some(self.clock.now());
            }
            Err(e) => warn!(session_id = %session.id(), error = %e, "saving session failed"),
        }
    }
}
