use std::path::Path;

use interview_core::model::{
    CandidateId, CompletedInterview, FieldOutcome, ResumeOutcome, Sender, Session, SessionId,
    SessionStateError, Stage, Status, SubmitKind, SubmitOutcome, TickOutcome,
};
use interview_core::scoring::Score;
use tracing::{debug, info, warn};

use super::context::SessionContext;
use super::cycle::{CycleController, GateOutcome};
use crate::ai::{Evaluation, QuestionSource, ResilientAi, ResumeExtraction};
use crate::error::{ResumeError, SessionError};
use crate::resume::{ResumeDocument, ResumeKind};
use crate::voice::{TranscriptBuffer, TranscriptEvent};

/// Result of presenting the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presented {
    pub index: usize,
    pub remaining_secs: u32,
    pub gate: GateOutcome,
}

/// Everything produced by batch evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReport {
    pub final_score: Score,
    pub summary: String,
    pub evaluations: Vec<Evaluation>,
    pub record: CompletedInterview,
}

/// Drives one candidate through upload, identity, interview and scoring.
pub struct InterviewWorkflow {
    context: SessionContext,
    ai: ResilientAi,
    cycle: CycleController,
    /// Answer being composed for the active question; never persisted.
    draft: TranscriptBuffer,
}

impl InterviewWorkflow {
    #[must_use]
    pub fn new(context: SessionContext, ai: ResilientAi, cycle: CycleController) -> Self {
        Self {
            context,
            ai,
            cycle,
            draft: TranscriptBuffer::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    #[must_use]
    pub fn cycle(&self) -> &CycleController {
        &self.cycle
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.context.session()
    }

    /// Starts a fresh session unless one is already active.
    pub async fn begin(&mut self) -> SessionId {
        if let Some(session) = self.context.session() {
            return session.id().clone();
        }
        let session = Session::create(self.context.now());
        let id = session.id().clone();
        info!(session_id = %id, "session created");
        self.context.install(session).await;
        id
    }

    // ─── Upload & identity ───────────────────────────────────────────────────

    /// Analyzes an uploaded resume and moves on to identity collection or
    /// straight to the interview.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the session is not awaiting a resume.
    pub async fn upload_resume(
        &mut self,
        resume: &ResumeDocument,
    ) -> Result<ResumeOutcome, SessionError> {
        self.begin().await;
        let file_name = resume.file_name.clone();
        self.context
            .apply(|s, now| s.begin_upload(&file_name, now))
            .await?;

        let outcome = match self.ai.extract_resume(resume).await {
            ResumeExtraction::Analysis(analysis) => {
                self.context
                    .apply(|s, now| {
                        s.apply_resume_analysis(CandidateId::generate(), analysis, &file_name, now)
                    })
                    .await?
            }
            ResumeExtraction::Unavailable => self.extraction_failed(&file_name).await?,
        };
        self.log_outcome(&outcome);
        Ok(outcome)
    }

    /// Reads a resume from disk. Unreadable documents fall back to manual
    /// collection; unsupported file types are rejected.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Resume` for unsupported file types.
    pub async fn upload_resume_file(&mut self, path: &Path) -> Result<ResumeOutcome, SessionError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        ResumeKind::from_file_name(&file_name)?;

        match ResumeDocument::from_path(path) {
            Ok(doc) => self.upload_resume(&doc).await,
            Err(e @ ResumeError::InvalidFileType { .. }) => Err(e.into()),
            Err(e) => {
                warn!(file_name = %file_name, error = %e, "resume text unavailable");
                self.begin().await;
                self.context
                    .apply(|s, now| s.begin_upload(&file_name, now))
                    .await?;
                let outcome = self.extraction_failed(&file_name).await?;
                self.log_outcome(&outcome);
                Ok(outcome)
            }
        }
    }

    async fn extraction_failed(&mut self, file_name: &str) -> Result<ResumeOutcome, SessionError> {
        self.context
            .apply(|s, now| s.apply_extraction_failure(CandidateId::generate(), file_name, now))
            .await?;
        let missing = self
            .context
            .session()
            .map(|s| s.missing_fields().to_vec())
            .unwrap_or_default();
        Ok(ResumeOutcome::NeedsFields(missing))
    }

    fn log_outcome(&self, outcome: &ResumeOutcome) {
        if let Some(session) = self.context.session() {
            match outcome {
                ResumeOutcome::ReadyToInterview => {
                    info!(session_id = %session.id(), "resume complete");
                }
                ResumeOutcome::NeedsFields(fields) => {
                    info!(session_id = %session.id(), missing = fields.len(), "collecting details");
                }
            }
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::State` for blank values or the wrong stage.
    pub async fn supply_field(&mut self, value: &str) -> Result<FieldOutcome, SessionError> {
        self.context.apply(|s, now| s.supply_field(value, now)).await
    }

    // ─── Interview cycle ─────────────────────────────────────────────────────

    /// Starts (or restarts) the interview, generating questions on first
    /// start. Returns where the questions came from when they were generated.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` before identity is complete or after
    /// completion.
    pub async fn start_interview(&mut self) -> Result<Option<QuestionSource>, SessionError> {
        self.context.apply(Session::start_interview).await?;

        let needs_questions = self
            .context
            .session()
            .is_some_and(|s| s.questions().is_empty());
        if !needs_questions {
            return Ok(None);
        }

        let analysis = self.context.session().and_then(|s| s.resume_analysis().cloned());
        let (batch, source) = self.ai.questions(analysis.as_ref()).await;
        self.context
            .apply(|s, now| s.set_questions(batch, now))
            .await?;
        info!(?source, "questions ready");
        Ok(Some(source))
    }

    /// Reveals the current question, waits for its audio gate and starts the
    /// countdown at the full time limit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` when no question is pending, the last
    /// answer is already in, or the interview is not running.
    pub async fn present_current(&mut self) -> Result<Presented, SessionError> {
        let play_audio = self.context.apply(Session::reveal_current).await?;
        let (index, text) = self
            .context
            .session()
            .and_then(|s| s.current_question().map(|q| (s.current_index(), q.text.clone())))
            .ok_or(SessionError::NoActiveSession)?;

        let gate = self.cycle.gate(&text, play_audio).await;
        let remaining_secs = self.context.apply(Session::begin_countdown).await?;
        Ok(Presented {
            index,
            remaining_secs,
            gate,
        })
    }

    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` without a session.
    pub fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        self.context.tick()
    }

    /// # Errors
    ///
    /// Returns `SessionError::State` when no question is active or a manual
    /// answer is blank.
    pub async fn submit(
        &mut self,
        draft: &str,
        kind: SubmitKind,
    ) -> Result<SubmitOutcome, SessionError> {
        let outcome = self.context.apply(|s, now| s.submit(draft, kind, now)).await?;
        self.draft.clear();
        Ok(outcome)
    }

    /// Adds voice or typed text to the answer draft.
    pub fn apply_transcript(&mut self, event: TranscriptEvent) {
        self.draft.apply(event);
    }

    #[must_use]
    pub fn draft(&self) -> String {
        self.draft.draft()
    }

    /// Submits whatever the draft holds; a timeout with content auto-submits
    /// it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit`].
    pub async fn submit_draft(&mut self, kind: SubmitKind) -> Result<SubmitOutcome, SessionError> {
        let draft = self.draft.draft();
        self.submit(&draft, kind).await
    }

    /// Grades every answer in order, then summarizes, scores and archives the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` while any question is unanswered.
    pub async fn evaluate_and_finish(&mut self) -> Result<FinalReport, SessionError> {
        let session = self.context.session().ok_or(SessionError::NoActiveSession)?;
        if session.is_completed() {
            return Err(SessionStateError::SessionCompleted.into());
        }
        let questions = session.questions().to_vec();
        let remaining = questions.iter().filter(|q| !q.is_answered()).count();
        if remaining > 0 || questions.is_empty() {
            return Err(SessionStateError::UnansweredQuestions { remaining }.into());
        }

        let mut evaluations = Vec::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            let evaluation = self.ai.evaluate(question).await;
            let score = evaluation.score;
            let reference = evaluation.reference_answer.clone();
            self.context
                .apply(|s, now| s.record_evaluation(index, score, reference, now))
                .await?;
            evaluations.push(evaluation);
        }

        let breakdown = evaluations
            .iter()
            .enumerate()
            .map(|(i, e)| format!("Q{}: {}", i + 1, e.score))
            .collect::<Vec<_>>()
            .join(" | ");
        self.context
            .apply(|s, now| {
                s.post(Sender::Ai, format!("Per-question scores: {breakdown}"), now);
                Ok(())
            })
            .await?;

        let (candidate, scored) = self
            .context
            .session()
            .and_then(|s| s.candidate().cloned().map(|c| (c, s.questions().to_vec())))
            .ok_or(SessionError::NoActiveSession)?;
        let summary = self.ai.summary(&candidate, &scored).await;

        let final_score = self
            .context
            .apply(|s, now| s.finish(summary.clone(), now))
            .await?;
        let record = self
            .context
            .session()
            .ok_or(SessionError::NoActiveSession)?
            .to_completed(self.context.now())?;
        self.context.archive(&record).await;
        info!(
            session_id = %record.session_id,
            final_score = final_score.value(),
            "interview completed"
        );

        Ok(FinalReport {
            final_score,
            summary,
            evaluations,
            record,
        })
    }

    // ─── Pause, resume & recovery ────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `SessionError::State` unless the interview is in progress.
    pub async fn pause(&mut self) -> Result<(), SessionError> {
        self.context.apply(Session::pause).await?;
        self.draft.clear();
        self.context.flush().await;
        Ok(())
    }

    /// Resumes without starting the countdown; call `present_current` next.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` unless the interview is paused.
    pub async fn resume(&mut self) -> Result<(), SessionError> {
        self.context.apply(Session::resume).await
    }

    /// Offers the most recent unfinished session back. A session that was
    /// mid-interview comes back paused.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the store cannot be read.
    pub async fn resume_from_store(&mut self) -> Result<Option<SessionId>, SessionError> {
        let sessions = self.context.store().get_all().await?;
        let Some(mut session) = sessions
            .into_iter()
            .find(|s| s.stage() != Stage::Completed)
        else {
            return Ok(None);
        };

        if session.status() == Status::InProgress {
            session.pause(self.context.now())?;
        }
        session.mark_returning();
        let id = session.id().clone();
        info!(session_id = %id, status = %session.status(), "returning to session");
        self.context.install(session).await;
        Ok(Some(id))
    }

    /// Writes any debounced changes.
    pub async fn flush(&mut self) {
        self.context.flush().await;
    }

    /// Drives `wait` (typically a prompt for the candidate) to completion,
    /// flushing pending changes on every autosave tick meanwhile.
    pub async fn autosave_while<F: Future>(&mut self, wait: F) -> F::Output {
        let mut ticker = self.cycle.autosave_ticker();
        tokio::pin!(wait);
        loop {
            tokio::select! {
                out = &mut wait => return out,
                _ = ticker.tick() => {
                    debug!("autosave tick");
                    self.context.flush().await;
                }
            }
        }
    }

    /// Drops the active session from memory; the stored record stays.
    pub fn reset(&mut self) -> Option<Session> {
        self.draft.clear();
        self.context.reset()
    }
}
