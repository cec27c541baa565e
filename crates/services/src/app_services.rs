use std::path::Path;
use std::sync::Arc;

use storage::mirror::{JsonFileMirror, RestoreReport};
use storage::repository::{SessionStore, Storage};
use tracing::{info, warn};

use crate::Clock;
use crate::ai::{AiConfig, HttpAiClient, ResilientAi};
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::sessions::{CycleController, CycleTimings, InterviewWorkflow, SessionContext};
use crate::voice::{AudioSink, NullAudioSink};

/// The AI collaborator configured by the environment, or a disabled one
/// whose every call falls back.
#[must_use]
pub fn ai_from_env() -> ResilientAi {
    match AiConfig::from_env() {
        Some(config) => {
            info!(model = %config.model, "AI collaborator enabled");
            ResilientAi::new(Arc::new(HttpAiClient::new(config)))
        }
        None => {
            warn!("INTERVIEW_AI_API_KEY not set; using built-in fallbacks");
            ResilientAi::disabled()
        }
    }
}

/// Assembles app-facing services over one store.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    restored: RestoreReport,
    ai: ResilientAi,
    audio: Arc<dyn AudioSink>,
    timings: CycleTimings,
}

impl AppServices {
    #[must_use]
    pub fn in_memory(clock: Clock, ai: ResilientAi) -> Self {
        Self::from_storage(Storage::in_memory(), RestoreReport::default(), clock, ai)
    }

    /// Build services backed by `SQLite`, with an optional JSON mirror.
    ///
    /// An unreadable mirror is logged and skipped; the app then runs on the
    /// primary store alone.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the mirror
    /// repair fails.
    pub async fn new_sqlite(
        db_url: &str,
        mirror_path: Option<&Path>,
        clock: Clock,
        ai: ResilientAi,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let (storage, restored) = match mirror_path.map(JsonFileMirror::open) {
            Some(Ok(mirror)) => storage.with_mirror(mirror).await?,
            Some(Err(e)) => {
                warn!(error = %e, "mirror unavailable; running without it");
                (storage, RestoreReport::default())
            }
            None => (storage, RestoreReport::default()),
        };
        Ok(Self::from_storage(storage, restored, clock, ai))
    }

    fn from_storage(storage: Storage, restored: RestoreReport, clock: Clock, ai: ResilientAi) -> Self {
        Self {
            clock,
            storage,
            restored,
            ai,
            audio: Arc::new(NullAudioSink),
            timings: CycleTimings::default(),
        }
    }

    #[must_use]
    pub fn with_audio(mut self, audio: Arc<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }

    #[must_use]
    pub fn with_timings(mut self, timings: CycleTimings) -> Self {
        self.timings = timings;
        self
    }

    /// What the mirror repair put back at startup.
    #[must_use]
    pub fn restored(&self) -> RestoreReport {
        self.restored
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.storage.sessions)
    }

    /// A workflow with its own empty session context.
    #[must_use]
    pub fn workflow(&self) -> InterviewWorkflow {
        let context = SessionContext::new(self.clock, self.store());
        let cycle = CycleController::new(self.ai.clone(), Arc::clone(&self.audio), self.timings);
        InterviewWorkflow::new(context, self.ai.clone(), cycle)
    }

    #[must_use]
    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.store())
    }
}
