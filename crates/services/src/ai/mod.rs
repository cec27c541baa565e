//! The hosted AI collaborator: resume analysis, question generation,
//! answer evaluation, summaries and speech.

use async_trait::async_trait;
use interview_core::model::{Candidate, Difficulty, GeneratedQuestion, Question, ResumeAnalysis};
use interview_core::scoring::Score;

use crate::error::AiError;
use crate::resume::ResumeDocument;

pub mod client;
pub mod fallback;
pub mod parse;
pub mod prompts;
pub mod retry;

pub use client::{AiConfig, HttpAiClient};
pub use fallback::{QuestionSource, ResilientAi, ResumeExtraction, static_questions};
pub use retry::{RetryPolicy, Strategy};

/// Result of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub score: Score,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub reference_answer: Option<String>,
}

/// Synthesized audio for one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Everything the interview needs from the hosted model.
///
/// Implementations may fail freely; `ResilientAi` turns every failure into a
/// deterministic fallback.
#[async_trait]
pub trait AiCollaborator: Send + Sync {
    /// # Errors
    ///
    /// Returns `AiError` when the document cannot be analyzed.
    async fn analyze_resume(&self, resume: &ResumeDocument) -> Result<ResumeAnalysis, AiError>;

    /// Personalized when `analysis` is given, generic otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when no usable question list is produced.
    async fn generate_questions(
        &self,
        analysis: Option<&ResumeAnalysis>,
    ) -> Result<Vec<GeneratedQuestion>, AiError>;

    /// # Errors
    ///
    /// Returns `AiError` when no evaluation could be obtained.
    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        difficulty: Difficulty,
    ) -> Result<Evaluation, AiError>;

    /// A short model answer for `question`, without grading anything.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when no answer text comes back.
    async fn reference_answer(&self, question: &str, difficulty: Difficulty)
    -> Result<String, AiError>;

    /// # Errors
    ///
    /// Returns `AiError` when no summary could be produced.
    async fn summarize(&self, candidate: &Candidate, questions: &[Question])
    -> Result<String, AiError>;

    /// # Errors
    ///
    /// Returns `AiError` when speech cannot be synthesized.
    async fn synthesize_speech(&self, text: &str) -> Result<SpeechClip, AiError>;
}

/// Collaborator used when no AI is configured; every call fails with
/// `AiError::Disabled`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAi;

#[async_trait]
impl AiCollaborator for DisabledAi {
    async fn analyze_resume(&self, _resume: &ResumeDocument) -> Result<ResumeAnalysis, AiError> {
        Err(AiError::Disabled)
    }

    async fn generate_questions(
        &self,
        _analysis: Option<&ResumeAnalysis>,
    ) -> Result<Vec<GeneratedQuestion>, AiError> {
        Err(AiError::Disabled)
    }

    async fn evaluate_answer(
        &self,
        _question: &str,
        _answer: &str,
        _difficulty: Difficulty,
    ) -> Result<Evaluation, AiError> {
        Err(AiError::Disabled)
    }

    async fn reference_answer(
        &self,
        _question: &str,
        _difficulty: Difficulty,
    ) -> Result<String, AiError> {
        Err(AiError::Disabled)
    }

    async fn summarize(
        &self,
        _candidate: &Candidate,
        _questions: &[Question],
    ) -> Result<String, AiError> {
        Err(AiError::Disabled)
    }

    async fn synthesize_speech(&self, _text: &str) -> Result<SpeechClip, AiError> {
        Err(AiError::Disabled)
    }
}
