use std::sync::Arc;

use interview_core::model::{Candidate, Difficulty, GeneratedQuestion, Question, ResumeAnalysis};
use interview_core::scoring::{
    FALLBACK_SCORE, NON_ANSWER_PENALTY, fallback_summary, interview_average, is_non_answer,
};
use tracing::{info, warn};

use super::parse::is_blank_analysis;
use super::{AiCollaborator, DisabledAi, Evaluation, SpeechClip};
use crate::resume::ResumeDocument;

const PERSONALIZED_ATTEMPTS: u32 = 2;
const PER_DIFFICULTY: usize = 2;

pub const FEEDBACK_UNAVAILABLE: &str = "Feedback unavailable.";
pub const NON_ANSWER_FEEDBACK: &str =
    "No substantive answer was given, so the minimum score applies.";

/// Where an interview's question batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Personalized,
    Generic,
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeExtraction {
    Analysis(ResumeAnalysis),
    /// Nothing could be extracted; every identity field is collected by hand.
    Unavailable,
}

/// The built-in batch used when generation fails outright.
#[must_use]
pub fn static_questions() -> Vec<GeneratedQuestion> {
    [
        (
            "Explain the difference between var, let, and const in JavaScript.",
            Difficulty::Easy,
        ),
        (
            "What are React hooks and why are they useful?",
            Difficulty::Easy,
        ),
        (
            "How would you design a REST API for a todo app? Outline endpoints and status codes.",
            Difficulty::Medium,
        ),
        (
            "Describe the event loop in Node.js and how it handles async I/O.",
            Difficulty::Medium,
        ),
        (
            "Given a slow React list rendering 10k items, propose optimizations with code snippets.",
            Difficulty::Hard,
        ),
        (
            "Design a scalable file upload service in Node.js with retries and chunking.",
            Difficulty::Hard,
        ),
    ]
    .into_iter()
    .map(|(text, d)| GeneratedQuestion::new(text, d))
    .collect()
}

/// Picks two questions per difficulty in easy, medium, hard order.
///
/// Returns `None` when any difficulty has fewer than two questions.
#[must_use]
pub fn normalize_batch(batch: Vec<GeneratedQuestion>) -> Option<Vec<GeneratedQuestion>> {
    let mut out = Vec::with_capacity(Difficulty::BATCH.len());
    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        let picked: Vec<_> = batch
            .iter()
            .filter(|q| q.difficulty == difficulty && !q.text.trim().is_empty())
            .take(PER_DIFFICULTY)
            .cloned()
            .collect();
        if picked.len() < PER_DIFFICULTY {
            return None;
        }
        out.extend(picked);
    }
    Some(out)
}

/// Wraps a collaborator so that every operation yields a usable value.
#[derive(Clone)]
pub struct ResilientAi {
    inner: Arc<dyn AiCollaborator>,
}

impl ResilientAi {
    #[must_use]
    pub fn new(inner: Arc<dyn AiCollaborator>) -> Self {
        Self { inner }
    }

    /// Every call falls straight through to its fallback.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledAi))
    }

    pub async fn extract_resume(&self, resume: &ResumeDocument) -> ResumeExtraction {
        match self.inner.analyze_resume(resume).await {
            Ok(analysis) if is_blank_analysis(&analysis) => {
                warn!(file_name = %resume.file_name, "resume analysis came back empty");
                ResumeExtraction::Unavailable
            }
            Ok(analysis) => ResumeExtraction::Analysis(analysis),
            Err(e) => {
                warn!(file_name = %resume.file_name, error = %e, "resume analysis failed");
                ResumeExtraction::Unavailable
            }
        }
    }

    /// Personalized (twice), then generic, then the static batch.
    pub async fn questions(
        &self,
        analysis: Option<&ResumeAnalysis>,
    ) -> (Vec<GeneratedQuestion>, QuestionSource) {
        if let Some(analysis) = analysis {
            for attempt in 1..=PERSONALIZED_ATTEMPTS {
                match self.inner.generate_questions(Some(analysis)).await {
                    Ok(batch) => match normalize_batch(batch) {
                        Some(batch) => return (batch, QuestionSource::Personalized),
                        None => warn!(attempt, "personalized batch had the wrong shape"),
                    },
                    Err(e) => warn!(attempt, error = %e, "personalized generation failed"),
                }
            }
        }

        match self.inner.generate_questions(None).await {
            Ok(batch) => {
                if let Some(batch) = normalize_batch(batch) {
                    return (batch, QuestionSource::Generic);
                }
                warn!("generic batch had the wrong shape");
            }
            Err(e) => warn!(error = %e, "generic generation failed"),
        }

        info!("using built-in question set");
        (static_questions(), QuestionSource::Static)
    }

    /// Grades one answered question.
    ///
    /// Non-answers skip the rubric and get the fixed penalty; only a
    /// reference answer is requested for them.
    pub async fn evaluate(&self, question: &Question) -> Evaluation {
        let answer = question.answer_text();
        if is_non_answer(answer) {
            let reference_answer = match self
                .inner
                .reference_answer(&question.text, question.difficulty)
                .await
            {
                Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                Ok(_) => None,
                Err(e) => {
                    warn!(question_id = %question.id, error = %e, "reference answer failed");
                    None
                }
            };
            return Evaluation {
                score: NON_ANSWER_PENALTY,
                feedback: NON_ANSWER_FEEDBACK.into(),
                strengths: Vec::new(),
                improvements: Vec::new(),
                reference_answer,
            };
        }

        self.inner
            .evaluate_answer(&question.text, answer, question.difficulty)
            .await
            .unwrap_or_else(|e| {
                warn!(question_id = %question.id, error = %e, "evaluation failed");
                Evaluation {
                    score: FALLBACK_SCORE,
                    feedback: FEEDBACK_UNAVAILABLE.into(),
                    strengths: Vec::new(),
                    improvements: Vec::new(),
                    reference_answer: None,
                }
            })
    }

    pub async fn summary(&self, candidate: &Candidate, questions: &[Question]) -> String {
        match self.inner.summarize(candidate, questions).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback_summary(questions.len(), interview_average(questions)),
            Err(e) => {
                warn!(error = %e, "summary failed");
                fallback_summary(questions.len(), interview_average(questions))
            }
        }
    }

    /// `None` when speech could not be synthesized.
    pub async fn speech(&self, text: &str) -> Option<SpeechClip> {
        match self.inner.synthesize_speech(text).await {
            Ok(clip) => Some(clip),
            Err(e) => {
                warn!(error = %e, "speech synthesis failed");
                None
            }
        }
    }
}
