use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::{
    candidate::{Candidate, IdentityField},
    chat::{Sender, Transcript},
    completed::CompletedInterview,
    ids::{CandidateId, SessionId},
    question::{GeneratedQuestion, Question},
    resume::ResumeAnalysis,
};
use crate::scoring::{Score, blended_final_score, interview_average};

const NO_ANSWER_PROVIDED: &str = "No answer provided";
const EXTRACTION_UNAVAILABLE: &str =
    "Resume extraction is unavailable. Please provide your details manually.";

//
// ─── STAGE / STATUS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Upload,
    CollectingInfo,
    Interview,
    Completed,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::CollectingInfo => "collecting-info",
            Self::Interview => "interview",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Draft,
    InProgress,
    Paused,
    Completed,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in-progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Milestones shown as progress bars on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressFlags {
    pub resume_uploaded: bool,
    pub info_collected: bool,
    pub questions_generated: bool,
    pub interview_started: bool,
}

impl ProgressFlags {
    #[must_use]
    pub fn completed_steps(&self) -> u8 {
        [
            self.resume_uploaded,
            self.info_collected,
            self.questions_generated,
            self.interview_started,
        ]
        .into_iter()
        .map(u8::from)
        .sum()
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.completed_steps() * 25
    }

    /// `interview_started ⇒ questions_generated ⇒ info_collected`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        (!self.interview_started || self.questions_generated)
            && (!self.questions_generated || self.info_collected)
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Every identity field was extracted.
    ReadyToInterview,
    /// These fields must be collected manually, in order.
    NeedsFields(Vec<IdentityField>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    NextField(IdentityField),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitKind {
    Manual,
    Skip,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Advanced { next_index: usize },
    ReadyForEvaluation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Running { remaining: u32 },
    Expired,
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("cannot {action} while stage is {stage}")]
    IllegalStage { action: &'static str, stage: Stage },

    #[error("cannot {action} while status is {status}")]
    IllegalStatus {
        action: &'static str,
        status: Status,
    },

    #[error("session is completed and can no longer change")]
    SessionCompleted,

    #[error("session has no candidate yet")]
    NoCandidate,

    #[error("input must not be blank")]
    BlankInput,

    #[error("question batch must not be empty")]
    EmptyQuestionBatch,

    #[error("questions were already generated for this session")]
    QuestionsAlreadySet,

    #[error("there is no current question")]
    NoCurrentQuestion,

    #[error("question {index} is out of range (len {len})")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("question is not active")]
    QuestionInactive,

    #[error("question must be revealed before its countdown starts")]
    NotRevealed,

    #[error("{remaining} question(s) still unanswered")]
    UnansweredQuestions { remaining: usize },

    #[error("every question is answered; the interview awaits evaluation")]
    AwaitingEvaluation,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One candidate's interview attempt, from resume upload to final score.
///
/// All mutation goes through the reducers below. Each takes `now`, stamps
/// `last_activity_at`, and rejects transitions that are illegal for the
/// current stage or status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    candidate: Option<Candidate>,
    questions: Vec<Question>,
    current_index: usize,
    interview_active: bool,
    question_active: bool,
    remaining_secs: u32,
    transcript: Transcript,
    stage: Stage,
    status: Status,
    progress: ProgressFlags,
    missing_fields: Vec<IdentityField>,
    field_cursor: usize,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    final_score: Option<Score>,
    final_summary: Option<String>,
    resume_analysis: Option<ResumeAnalysis>,
    first_visit: bool,
}

impl Session {
    /// Starts a fresh draft session with a newly generated id.
    #[must_use]
    pub fn create(now: DateTime<Utc>) -> Self {
        Self::with_id(SessionId::generate(now), now)
    }

    #[must_use]
    pub fn with_id(id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            candidate: None,
            questions: Vec::new(),
            current_index: 0,
            interview_active: false,
            question_active: false,
            remaining_secs: 0,
            transcript: Transcript::new(),
            stage: Stage::Upload,
            status: Status::Draft,
            progress: ProgressFlags::default(),
            missing_fields: Vec::new(),
            field_cursor: 0,
            started_at: now,
            last_activity_at: now,
            final_score: None,
            final_summary: None,
            resume_analysis: None,
            first_visit: true,
        }
    }

    // ─── Upload & identity ───────────────────────────────────────────────────

    /// Records that a resume file was received and is being analyzed.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::IllegalStage` outside the upload stage.
    pub fn begin_upload(
        &mut self,
        file_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SessionStateError> {
        self.expect_stage(Stage::Upload, "upload a resume")?;
        self.transcript.push(
            Sender::System,
            format!("Resume uploaded: {file_name}. Analyzing with AI..."),
            now,
        );
        self.touch(now);
        Ok(())
    }

    /// Applies a resume analysis and decides whether identity details are
    /// still missing.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::IllegalStage` outside the upload stage.
    pub fn apply_resume_analysis(
        &mut self,
        candidate_id: CandidateId,
        analysis: ResumeAnalysis,
        file_name: &str,
        now: DateTime<Utc>,
    ) -> Result<ResumeOutcome, SessionStateError> {
        self.expect_stage(Stage::Upload, "apply a resume analysis")?;

        let mut candidate = Candidate::new(candidate_id, file_name);
        for field in IdentityField::ORDER {
            if let Some(value) = analysis.identity(field) {
                candidate.set_field(field, value);
            }
        }
        let detailed = analysis.detailed_summary();
        candidate.resume_text = if detailed.is_empty() {
            analysis.summary.clone()
        } else {
            detailed.clone()
        };
        candidate.resume_score = analysis.score;
        candidate.resume_strengths = analysis.strengths.clone();
        candidate.resume_weaknesses = analysis.weaknesses.clone();

        let score_text = analysis
            .score
            .map_or_else(|| "n/a".to_string(), |s| s.value().to_string());
        self.transcript.push(
            Sender::Ai,
            format!(
                "Resume analysis complete! I found {} key strengths and identified areas for improvement. Resume score: {score_text}/100.",
                analysis.strengths.len()
            ),
            now,
        );
        self.transcript.push(
            Sender::Ai,
            format!("Detailed Resume Analysis Summary:\n\n{detailed}"),
            now,
        );

        let missing = candidate.missing_fields();
        self.candidate = Some(candidate);
        self.resume_analysis = Some(analysis);
        self.progress.resume_uploaded = true;

        if missing.is_empty() {
            self.progress.info_collected = true;
            self.stage = Stage::Interview;
            self.transcript.push(
                Sender::Ai,
                "Perfect! I have all your information. Let's begin your interview. I'll generate personalized questions based on your resume and we'll start with the first question.",
                now,
            );
            self.touch(now);
            return Ok(ResumeOutcome::ReadyToInterview);
        }

        let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
        self.transcript.push(
            Sender::Ai,
            format!(
                "I couldn't confidently extract {} from your resume. Please provide them to continue.",
                names.join(", ")
            ),
            now,
        );
        self.enter_collecting(missing.clone(), now);
        Ok(ResumeOutcome::NeedsFields(missing))
    }

    /// Falls back to manual collection of every identity field.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::IllegalStage` outside the upload stage.
    pub fn apply_extraction_failure(
        &mut self,
        candidate_id: CandidateId,
        file_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SessionStateError> {
        self.expect_stage(Stage::Upload, "record an extraction failure")?;
        self.candidate = Some(Candidate::new(candidate_id, file_name));
        self.progress.resume_uploaded = true;
        self.transcript
            .push(Sender::Ai, EXTRACTION_UNAVAILABLE, now);
        self.enter_collecting(IdentityField::ORDER.to_vec(), now);
        Ok(())
    }

    fn enter_collecting(&mut self, missing: Vec<IdentityField>, now: DateTime<Utc>) {
        self.stage = Stage::CollectingInfo;
        self.field_cursor = 0;
        if let Some(first) = missing.first() {
            self.transcript.push(Sender::Ai, first.prompt(), now);
        }
        self.missing_fields = missing;
        self.touch(now);
    }

    /// Supplies the value for the field currently being asked for.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::BlankInput` for blank values and
    /// `SessionStateError::IllegalStage` outside info collection.
    pub fn supply_field(
        &mut self,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<FieldOutcome, SessionStateError> {
        self.expect_stage(Stage::CollectingInfo, "supply a field")?;
        let value = value.trim();
        if value.is_empty() {
            return Err(SessionStateError::BlankInput);
        }
        let Some(field) = self.current_field() else {
            return self.finish_collecting(now).map(|()| FieldOutcome::Complete);
        };
        let candidate = self
            .candidate
            .as_mut()
            .ok_or(SessionStateError::NoCandidate)?;
        candidate.set_field(field, value);
        self.transcript.push(Sender::User, value, now);
        self.field_cursor += 1;

        if let Some(next) = self.current_field() {
            self.transcript.push(Sender::Ai, next.prompt(), now);
            self.touch(now);
            return Ok(FieldOutcome::NextField(next));
        }
        self.finish_collecting(now)?;
        Ok(FieldOutcome::Complete)
    }

    fn finish_collecting(&mut self, now: DateTime<Utc>) -> Result<(), SessionStateError> {
        if self.candidate.is_none() {
            return Err(SessionStateError::NoCandidate);
        }
        self.progress.info_collected = true;
        self.stage = Stage::Interview;
        self.transcript.push(
            Sender::Ai,
            "Perfect! I now have all your information. Let's begin your interview. Are you ready to start?",
            now,
        );
        self.touch(now);
        Ok(())
    }

    // ─── Interview ───────────────────────────────────────────────────────────

    /// Marks the interview as started; the current index is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::IllegalStage` before identity is complete
    /// or after completion.
    pub fn start_interview(&mut self, now: DateTime<Utc>) -> Result<(), SessionStateError> {
        match self.stage {
            Stage::Interview => {}
            Stage::CollectingInfo
                if self.candidate.as_ref().is_some_and(Candidate::has_identity) =>
            {
                self.stage = Stage::Interview;
                self.progress.info_collected = true;
            }
            Stage::Completed => return Err(SessionStateError::SessionCompleted),
            stage => {
                return Err(SessionStateError::IllegalStage {
                    action: "start the interview",
                    stage,
                });
            }
        }
        self.interview_active = true;
        self.status = Status::InProgress;
        self.progress.interview_started = true;
        self.touch(now);
        Ok(())
    }

    /// Installs the question batch for this interview.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::EmptyQuestionBatch` for an empty batch and
    /// `SessionStateError::QuestionsAlreadySet` when a batch exists.
    pub fn set_questions(
        &mut self,
        batch: Vec<GeneratedQuestion>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionStateError> {
        self.expect_stage(Stage::Interview, "set questions")?;
        if batch.is_empty() {
            return Err(SessionStateError::EmptyQuestionBatch);
        }
        if !self.questions.is_empty() {
            return Err(SessionStateError::QuestionsAlreadySet);
        }
        self.questions = Question::from_batch(batch);
        self.current_index = 0;
        self.progress.questions_generated = true;
        self.touch(now);
        Ok(())
    }

    /// Pauses the interview; the running countdown is dropped.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::IllegalStatus` unless in progress.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SessionStateError> {
        self.expect_stage(Stage::Interview, "pause")?;
        if self.status != Status::InProgress {
            return Err(SessionStateError::IllegalStatus {
                action: "pause",
                status: self.status,
            });
        }
        self.interview_active = false;
        self.question_active = false;
        self.remaining_secs = 0;
        self.status = Status::Paused;
        self.touch(now);
        Ok(())
    }

    /// Resumes a paused interview without restarting the countdown; the
    /// caller reveals the current question again first.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::IllegalStatus` unless paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), SessionStateError> {
        if self.status != Status::Paused {
            return Err(SessionStateError::IllegalStatus {
                action: "resume",
                status: self.status,
            });
        }
        self.interview_active = true;
        self.question_active = false;
        self.remaining_secs = 0;
        self.status = Status::InProgress;
        self.touch(now);
        Ok(())
    }

    /// Posts the current question on its first reveal.
    ///
    /// Returns `true` when the question was revealed just now and its audio
    /// should play. Later calls post nothing and return `false`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NoCurrentQuestion` when no question is
    /// pending, `SessionStateError::AwaitingEvaluation` once the last answer
    /// is in and `SessionStateError::IllegalStatus` unless in progress.
    pub fn reveal_current(&mut self, now: DateTime<Utc>) -> Result<bool, SessionStateError> {
        self.expect_running("reveal a question")?;
        let index = self.current_index;
        let question = self
            .questions
            .get_mut(index)
            .ok_or(SessionStateError::NoCurrentQuestion)?;
        if question.is_answered() {
            return Err(SessionStateError::AwaitingEvaluation);
        }
        if question.revealed {
            return Ok(false);
        }
        question.revealed = true;
        let text = question.text.clone();
        self.transcript.push(Sender::Ai, text, now);
        self.touch(now);
        Ok(true)
    }

    /// Activates the current question with its full time limit.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NotRevealed` if the question has not been
    /// posted yet and `SessionStateError::AwaitingEvaluation` if it already
    /// holds an answer.
    pub fn begin_countdown(&mut self, now: DateTime<Utc>) -> Result<u32, SessionStateError> {
        self.expect_running("start the countdown")?;
        let question = self
            .questions
            .get(self.current_index)
            .ok_or(SessionStateError::NoCurrentQuestion)?;
        if question.is_answered() {
            return Err(SessionStateError::AwaitingEvaluation);
        }
        if !question.revealed {
            return Err(SessionStateError::NotRevealed);
        }
        self.remaining_secs = question.time_limit_secs;
        self.question_active = true;
        self.touch(now);
        Ok(self.remaining_secs)
    }

    /// One second of countdown. Not a material change; `last_activity_at`
    /// is left alone.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.question_active {
            return TickOutcome::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining: self.remaining_secs,
            }
        }
    }

    /// Records the answer for the active question and deactivates it.
    ///
    /// A blank manual submission is rejected and leaves the question active.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::QuestionInactive` when no question is
    /// accepting answers.
    pub fn submit(
        &mut self,
        draft: &str,
        kind: SubmitKind,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, SessionStateError> {
        self.expect_stage(Stage::Interview, "submit an answer")?;
        if !self.question_active {
            return Err(SessionStateError::QuestionInactive);
        }
        let draft = draft.trim();
        let (answer, bubble) = match kind {
            SubmitKind::Manual if draft.is_empty() => return Err(SessionStateError::BlankInput),
            SubmitKind::Skip if draft.is_empty() => (NO_ANSWER_PROVIDED.to_string(), true),
            SubmitKind::Timeout if draft.is_empty() => (String::new(), false),
            _ => (draft.to_string(), true),
        };

        let index = self.current_index;
        let remaining = self.remaining_secs;
        let question = self
            .questions
            .get_mut(index)
            .ok_or(SessionStateError::NoCurrentQuestion)?;
        let spent = question.time_limit_secs.saturating_sub(remaining);
        question.record_answer(answer.clone(), spent);

        self.question_active = false;
        self.remaining_secs = 0;
        if bubble {
            self.transcript.push(Sender::User, answer, now);
        }
        self.touch(now);

        if index + 1 < self.questions.len() {
            self.current_index = index + 1;
            Ok(SubmitOutcome::Advanced {
                next_index: self.current_index,
            })
        } else {
            Ok(SubmitOutcome::ReadyForEvaluation)
        }
    }

    /// Stores the evaluated score for the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::QuestionOutOfRange` for a bad index.
    pub fn record_evaluation(
        &mut self,
        index: usize,
        score: Score,
        reference_answer: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionStateError> {
        self.expect_stage(Stage::Interview, "record an evaluation")?;
        let len = self.questions.len();
        let question = self
            .questions
            .get_mut(index)
            .ok_or(SessionStateError::QuestionOutOfRange { index, len })?;
        question.record_evaluation(score, reference_answer);
        self.touch(now);
        Ok(())
    }

    /// Appends a message to the transcript.
    pub fn post(&mut self, sender: Sender, text: impl Into<String>, now: DateTime<Utc>) {
        self.transcript.push(sender, text, now);
        self.touch(now);
    }

    /// Computes the blended final score and completes the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::UnansweredQuestions` while any question
    /// is still open.
    pub fn finish(
        &mut self,
        summary: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Score, SessionStateError> {
        self.expect_stage(Stage::Interview, "finish")?;
        if self.questions.is_empty() {
            return Err(SessionStateError::NoCurrentQuestion);
        }
        let remaining = self.questions.iter().filter(|q| !q.is_answered()).count();
        if remaining > 0 {
            return Err(SessionStateError::UnansweredQuestions { remaining });
        }
        let resume_score = self.candidate.as_ref().and_then(|c| c.resume_score);
        let final_score = blended_final_score(interview_average(&self.questions), resume_score);
        let summary = summary.into();

        self.transcript.push(
            Sender::Ai,
            format!("Interview completed! Your final score is {}%. {summary}", final_score.value()),
            now,
        );
        self.final_score = Some(final_score);
        self.final_summary = Some(summary);
        self.current_index = self.questions.len();
        self.interview_active = false;
        self.question_active = false;
        self.remaining_secs = 0;
        self.stage = Stage::Completed;
        self.status = Status::Completed;
        self.touch(now);
        Ok(final_score)
    }

    /// Snapshot for the completed partition.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::IllegalStage` unless completed.
    pub fn to_completed(&self, now: DateTime<Utc>) -> Result<CompletedInterview, SessionStateError> {
        self.expect_stage(Stage::Completed, "archive")?;
        let candidate = self
            .candidate
            .clone()
            .ok_or(SessionStateError::NoCandidate)?;
        let (Some(final_score), Some(final_summary)) =
            (self.final_score, self.final_summary.clone())
        else {
            return Err(SessionStateError::IllegalStatus {
                action: "archive",
                status: self.status,
            });
        };
        Ok(CompletedInterview {
            session_id: self.id.clone(),
            candidate,
            questions: self.questions.clone(),
            final_score,
            final_summary,
            started_at: self.started_at,
            completed_at: now,
            chat_history: self.transcript.messages().to_vec(),
        })
    }

    /// Clears the first-visit flag once the session has been offered back.
    pub fn mark_returning(&mut self) {
        self.first_visit = false;
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    #[must_use]
    pub fn interview_active(&self) -> bool {
        self.interview_active
    }

    #[must_use]
    pub fn question_active(&self) -> bool {
        self.question_active
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn progress(&self) -> ProgressFlags {
        self.progress
    }

    #[must_use]
    pub fn missing_fields(&self) -> &[IdentityField] {
        &self.missing_fields
    }

    /// The identity field currently being asked for.
    #[must_use]
    pub fn current_field(&self) -> Option<IdentityField> {
        if self.stage != Stage::CollectingInfo {
            return None;
        }
        self.missing_fields.get(self.field_cursor).copied()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    #[must_use]
    pub fn final_score(&self) -> Option<Score> {
        self.final_score
    }

    #[must_use]
    pub fn final_summary(&self) -> Option<&str> {
        self.final_summary.as_deref()
    }

    #[must_use]
    pub fn resume_analysis(&self) -> Option<&ResumeAnalysis> {
        self.resume_analysis.as_ref()
    }

    #[must_use]
    pub fn first_visit(&self) -> bool {
        self.first_visit
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.stage == Stage::Completed
    }

    /// Every question is answered and none is running, but no final score
    /// exists yet.
    #[must_use]
    pub fn awaiting_evaluation(&self) -> bool {
        self.stage == Stage::Interview
            && !self.questions.is_empty()
            && !self.question_active
            && self.questions.iter().all(Question::is_answered)
    }

    #[must_use]
    pub fn progress_is_consistent(&self) -> bool {
        self.progress.is_consistent()
    }

    // ─── Guards ──────────────────────────────────────────────────────────────

    fn expect_stage(&self, stage: Stage, action: &'static str) -> Result<(), SessionStateError> {
        if self.stage == stage {
            return Ok(());
        }
        if self.stage == Stage::Completed {
            return Err(SessionStateError::SessionCompleted);
        }
        Err(SessionStateError::IllegalStage {
            action,
            stage: self.stage,
        })
    }

    fn expect_running(&self, action: &'static str) -> Result<(), SessionStateError> {
        self.expect_stage(Stage::Interview, action)?;
        if self.status != Status::InProgress {
            return Err(SessionStateError::IllegalStatus {
                action,
                status: self.status,
            });
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity_at {
            self.last_activity_at = now;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;
    use crate::scoring::NON_ANSWER_PENALTY;
    use crate::time::fixed_now;

    fn analysis(name: Option<&str>, email: Option<&str>, phone: Option<&str>) -> ResumeAnalysis {
        ResumeAnalysis {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            strengths: vec!["Rust".into(), "SQL".into()],
            weaknesses: vec!["CSS".into()],
            summary: "Solid backend engineer.".into(),
            score: Some(Score::new(70).unwrap()),
        }
    }

    fn batch() -> Vec<GeneratedQuestion> {
        Difficulty::BATCH
            .iter()
            .enumerate()
            .map(|(i, d)| GeneratedQuestion::new(format!("Question {}", i + 1), *d))
            .collect()
    }

    fn interviewing() -> Session {
        let now = fixed_now();
        let mut s = Session::create(now);
        s.begin_upload("cv.pdf", now).unwrap();
        s.apply_resume_analysis(
            CandidateId::generate(),
            analysis(Some("Ada"), Some("ada@example.com"), Some("555-123-4567")),
            "cv.pdf",
            now,
        )
        .unwrap();
        s.set_questions(batch(), now).unwrap();
        s.start_interview(now).unwrap();
        s
    }

    fn answer_current(s: &mut Session, text: &str, kind: SubmitKind) -> SubmitOutcome {
        let now = fixed_now();
        s.reveal_current(now).unwrap();
        s.begin_countdown(now).unwrap();
        s.submit(text, kind, now).unwrap()
    }

    #[test]
    fn full_identity_goes_straight_to_interview() {
        let now = fixed_now();
        let mut s = Session::create(now);
        let outcome = s
            .apply_resume_analysis(
                CandidateId::generate(),
                analysis(Some("Ada"), Some("ada@example.com"), Some("555-123-4567")),
                "cv.pdf",
                now,
            )
            .unwrap();
        assert_eq!(outcome, ResumeOutcome::ReadyToInterview);
        assert_eq!(s.stage(), Stage::Interview);
        assert!(s.progress().resume_uploaded);
        assert!(s.progress().info_collected);
        assert_eq!(s.status(), Status::Draft);
    }

    #[test]
    fn missing_phone_prompts_exactly_once() {
        let now = fixed_now();
        let mut s = Session::create(now);
        let outcome = s
            .apply_resume_analysis(
                CandidateId::generate(),
                analysis(Some("Ada"), Some("ada@example.com"), None),
                "cv.pdf",
                now,
            )
            .unwrap();
        assert_eq!(outcome, ResumeOutcome::NeedsFields(vec![IdentityField::Phone]));
        assert_eq!(s.stage(), Stage::CollectingInfo);
        assert_eq!(s.missing_fields(), &[IdentityField::Phone]);
        assert_eq!(s.transcript().count_text(IdentityField::Phone.prompt()), 1);
        assert_eq!(s.transcript().count_text(IdentityField::Name.prompt()), 0);
    }

    #[test]
    fn supplying_fields_walks_the_missing_list() {
        let now = fixed_now();
        let mut s = Session::create(now);
        s.apply_extraction_failure(CandidateId::generate(), "cv.pdf", now)
            .unwrap();
        assert_eq!(s.current_field(), Some(IdentityField::Name));
        assert_eq!(s.transcript().count_text(EXTRACTION_UNAVAILABLE), 1);

        assert_eq!(s.supply_field("  ", now), Err(SessionStateError::BlankInput));
        assert_eq!(
            s.supply_field("Ada Lovelace", now).unwrap(),
            FieldOutcome::NextField(IdentityField::Email)
        );
        assert_eq!(
            s.supply_field("ada@example.com", now).unwrap(),
            FieldOutcome::NextField(IdentityField::Phone)
        );
        assert_eq!(s.supply_field("555 0100", now).unwrap(), FieldOutcome::Complete);
        assert_eq!(s.stage(), Stage::Interview);
        assert!(s.progress().info_collected);
        assert_eq!(s.candidate().unwrap().display_name(), "Ada Lovelace");
    }

    #[test]
    fn start_from_collecting_requires_identity() {
        let now = fixed_now();
        let mut s = Session::create(now);
        s.apply_extraction_failure(CandidateId::generate(), "cv.pdf", now)
            .unwrap();
        assert!(matches!(
            s.start_interview(now),
            Err(SessionStateError::IllegalStage { .. })
        ));
    }

    #[test]
    fn countdown_requires_reveal() {
        let mut s = interviewing();
        assert_eq!(
            s.begin_countdown(fixed_now()),
            Err(SessionStateError::NotRevealed)
        );
        assert!(s.reveal_current(fixed_now()).unwrap());
        assert!(!s.reveal_current(fixed_now()).unwrap());
        assert_eq!(s.begin_countdown(fixed_now()).unwrap(), 20);
        assert!(s.question_active());
    }

    #[test]
    fn second_submit_fails_with_question_inactive() {
        let mut s = interviewing();
        answer_current(&mut s, "first", SubmitKind::Manual);
        assert_eq!(
            s.submit("again", SubmitKind::Manual, fixed_now()),
            Err(SessionStateError::QuestionInactive)
        );
    }

    #[test]
    fn blank_manual_submit_keeps_question_active() {
        let mut s = interviewing();
        s.reveal_current(fixed_now()).unwrap();
        s.begin_countdown(fixed_now()).unwrap();
        assert_eq!(
            s.submit("  ", SubmitKind::Manual, fixed_now()),
            Err(SessionStateError::BlankInput)
        );
        assert!(s.question_active());
    }

    #[test]
    fn submission_records_elapsed_time() {
        let mut s = interviewing();
        s.reveal_current(fixed_now()).unwrap();
        s.begin_countdown(fixed_now()).unwrap();
        for _ in 0..7 {
            s.tick();
        }
        s.submit("answer", SubmitKind::Manual, fixed_now()).unwrap();
        let q = &s.questions()[0];
        assert_eq!(q.time_spent_secs, 7);
        assert!(q.time_spent_secs <= q.time_limit_secs);
    }

    #[test]
    fn tick_expires_at_zero() {
        let mut s = interviewing();
        assert_eq!(s.tick(), TickOutcome::Idle);
        s.reveal_current(fixed_now()).unwrap();
        s.begin_countdown(fixed_now()).unwrap();
        for _ in 0..19 {
            assert!(matches!(s.tick(), TickOutcome::Running { .. }));
        }
        assert_eq!(s.tick(), TickOutcome::Expired);
        s.submit("", SubmitKind::Timeout, fixed_now()).unwrap();
        assert_eq!(s.questions()[0].time_spent_secs, 20);
    }

    #[test]
    fn timeout_with_blank_draft_posts_no_bubble() {
        let mut s = interviewing();
        s.reveal_current(fixed_now()).unwrap();
        s.begin_countdown(fixed_now()).unwrap();
        let before = s.transcript().len();
        s.submit("   ", SubmitKind::Timeout, fixed_now()).unwrap();
        assert_eq!(s.transcript().len(), before);
        assert_eq!(s.questions()[0].answer.as_deref(), Some(""));
    }

    #[test]
    fn skip_with_blank_draft_records_placeholder() {
        let mut s = interviewing();
        answer_current(&mut s, "", SubmitKind::Skip);
        assert_eq!(s.questions()[0].answer.as_deref(), Some(NO_ANSWER_PROVIDED));
        assert_eq!(
            s.transcript().last().map(|m| m.sender),
            Some(Sender::User)
        );
    }

    #[test]
    fn pause_drops_countdown_and_resume_does_not_restart_it() {
        let mut s = interviewing();
        s.reveal_current(fixed_now()).unwrap();
        s.begin_countdown(fixed_now()).unwrap();
        s.pause(fixed_now()).unwrap();
        assert_eq!(s.status(), Status::Paused);
        assert!(!s.question_active());
        assert_eq!(s.remaining_secs(), 0);
        assert!(s.reveal_current(fixed_now()).is_err());

        s.resume(fixed_now()).unwrap();
        assert_eq!(s.status(), Status::InProgress);
        assert!(!s.question_active());
        assert_eq!(s.remaining_secs(), 0);
        assert!(!s.reveal_current(fixed_now()).unwrap());
        assert_eq!(s.begin_countdown(fixed_now()).unwrap(), 20);
    }

    #[test]
    fn last_answer_cannot_be_replaced_after_resume() {
        let mut s = interviewing();
        for i in 0..5 {
            answer_current(&mut s, &format!("answer {i}"), SubmitKind::Manual);
        }
        s.reveal_current(fixed_now()).unwrap();
        s.begin_countdown(fixed_now()).unwrap();
        for _ in 0..10 {
            s.tick();
        }
        assert_eq!(
            s.submit("first answer", SubmitKind::Manual, fixed_now()),
            Ok(SubmitOutcome::ReadyForEvaluation)
        );
        s.pause(fixed_now()).unwrap();
        s.resume(fixed_now()).unwrap();

        assert_eq!(
            s.reveal_current(fixed_now()),
            Err(SessionStateError::AwaitingEvaluation)
        );
        assert_eq!(
            s.begin_countdown(fixed_now()),
            Err(SessionStateError::AwaitingEvaluation)
        );
        assert_eq!(
            s.submit("second answer", SubmitKind::Manual, fixed_now()),
            Err(SessionStateError::QuestionInactive)
        );
        assert!(s.awaiting_evaluation());
        let last = &s.questions()[5];
        assert_eq!(last.answer.as_deref(), Some("first answer"));
        assert_eq!(last.time_spent_secs, 10);
    }

    #[test]
    fn restarting_interview_keeps_index() {
        let mut s = interviewing();
        answer_current(&mut s, "a", SubmitKind::Manual);
        s.start_interview(fixed_now()).unwrap();
        assert_eq!(s.current_index(), 1);
    }

    #[test]
    fn finishing_blends_scores_and_archives() {
        let mut s = interviewing();
        let mut last = SubmitOutcome::Advanced { next_index: 0 };
        for _ in 0..6 {
            last = answer_current(&mut s, "I don't know", SubmitKind::Manual);
        }
        assert_eq!(last, SubmitOutcome::ReadyForEvaluation);
        assert!(s.awaiting_evaluation());

        for i in 0..6 {
            s.record_evaluation(i, NON_ANSWER_PENALTY, None, fixed_now())
                .unwrap();
        }
        let score = s.finish("Needs work.", fixed_now()).unwrap();
        assert_eq!(score.value(), 18);
        assert_eq!(s.stage(), Stage::Completed);
        assert_eq!(s.current_index(), s.questions().len());
        assert!(s.current_question().is_none());

        let completed = s.to_completed(fixed_now()).unwrap();
        assert_eq!(completed.final_score, score);
        assert_eq!(completed.final_summary, "Needs work.");
        assert!(s.set_questions(batch(), fixed_now()).is_err());
    }

    #[test]
    fn finish_rejects_unanswered_questions() {
        let mut s = interviewing();
        answer_current(&mut s, "a", SubmitKind::Manual);
        assert_eq!(
            s.finish("x", fixed_now()),
            Err(SessionStateError::UnansweredQuestions { remaining: 5 })
        );
    }

    #[test]
    fn completed_session_rejects_mutation() {
        let mut s = interviewing();
        for _ in 0..6 {
            answer_current(&mut s, "answer", SubmitKind::Manual);
        }
        s.finish("done", fixed_now()).unwrap();
        assert_eq!(
            s.supply_field("Grace", fixed_now()),
            Err(SessionStateError::SessionCompleted)
        );
        assert_eq!(
            s.start_interview(fixed_now()),
            Err(SessionStateError::SessionCompleted)
        );
    }

    #[test]
    fn progress_consistency_is_reported() {
        let flags = ProgressFlags {
            interview_started: true,
            ..ProgressFlags::default()
        };
        assert!(!flags.is_consistent());
        let s = interviewing();
        assert!(s.progress_is_consistent());
        assert_eq!(s.progress().percent(), 100);
    }

    #[test]
    fn session_survives_json_round_trip() {
        let s = interviewing();
        let json = serde_json::to_string(&s).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
