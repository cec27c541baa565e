#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use interview_core::model::{
    Candidate, Difficulty, GeneratedQuestion, Question, ResumeAnalysis,
};
use interview_core::scoring::Score;
use interview_core::time::fixed_clock;
use services::ai::{AiCollaborator, Evaluation, ResilientAi, SpeechClip};
use services::error::AiError;
use services::resume::ResumeDocument;
use services::sessions::{CycleController, InterviewWorkflow, SessionContext};
use storage::repository::SessionStore;

/// Deterministic stand-in for the hosted model.
pub struct ScriptedAi {
    pub analysis: Option<ResumeAnalysis>,
    pub personalized_failures: Mutex<u32>,
    pub generic_fails: bool,
    pub score: u8,
    pub calls: Mutex<Vec<&'static str>>,
}

impl ScriptedAi {
    pub fn new(analysis: Option<ResumeAnalysis>) -> Self {
        Self {
            analysis,
            personalized_failures: Mutex::new(0),
            generic_fails: false,
            score: 80,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_personalized(mut self, times: u32) -> Self {
        self.personalized_failures = Mutex::new(times);
        self
    }

    pub fn scoring(mut self, score: u8) -> Self {
        self.score = score;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Six questions, deliberately out of difficulty order.
pub fn shuffled_batch(prefix: &str) -> Vec<GeneratedQuestion> {
    [
        Difficulty::Hard,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Easy,
        Difficulty::Hard,
        Difficulty::Medium,
    ]
    .into_iter()
    .enumerate()
    .map(|(i, d)| GeneratedQuestion::new(format!("{prefix} question {}", i + 1), d))
    .collect()
}

#[async_trait]
impl AiCollaborator for ScriptedAi {
    async fn analyze_resume(&self, _resume: &ResumeDocument) -> Result<ResumeAnalysis, AiError> {
        self.record("analyze_resume");
        self.analysis.clone().ok_or(AiError::EmptyResponse)
    }

    async fn generate_questions(
        &self,
        analysis: Option<&ResumeAnalysis>,
    ) -> Result<Vec<GeneratedQuestion>, AiError> {
        if analysis.is_some() {
            self.record("personalized");
            let mut left = self.personalized_failures.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(AiError::Parse("scripted failure".into()));
            }
            return Ok(shuffled_batch("Personalized"));
        }
        self.record("generic");
        if self.generic_fails {
            return Err(AiError::Parse("scripted failure".into()));
        }
        Ok(shuffled_batch("Generic"))
    }

    async fn evaluate_answer(
        &self,
        question: &str,
        _answer: &str,
        _difficulty: Difficulty,
    ) -> Result<Evaluation, AiError> {
        self.record("evaluate");
        Ok(Evaluation {
            score: Score::new(self.score).map_err(|e| AiError::Parse(e.to_string()))?,
            feedback: "Solid.".into(),
            strengths: vec!["clarity".into()],
            improvements: Vec::new(),
            reference_answer: Some(format!("Reference for {question}")),
        })
    }

    async fn reference_answer(
        &self,
        question: &str,
        _difficulty: Difficulty,
    ) -> Result<String, AiError> {
        self.record("reference");
        Ok(format!("Reference for {question}"))
    }

    async fn summarize(
        &self,
        candidate: &Candidate,
        questions: &[Question],
    ) -> Result<String, AiError> {
        self.record("summarize");
        Ok(format!(
            "{} answered {} questions.",
            candidate.display_name(),
            questions.len()
        ))
    }

    async fn synthesize_speech(&self, _text: &str) -> Result<SpeechClip, AiError> {
        Err(AiError::Disabled)
    }
}

pub fn full_analysis(name: &str, email: &str, phone: Option<&str>, score: u8) -> ResumeAnalysis {
    ResumeAnalysis {
        name: Some(name.into()),
        email: Some(email.into()),
        phone: phone.map(Into::into),
        strengths: vec!["React".into(), "Node.js".into()],
        weaknesses: vec!["Testing".into()],
        summary: format!("{name} is a full stack developer."),
        score: Score::new(score).ok(),
    }
}

pub fn resume(file_name: &str) -> ResumeDocument {
    ResumeDocument::from_bytes(file_name, b"Resume text with enough content.").unwrap()
}

pub fn workflow(ai: Arc<ScriptedAi>, store: Arc<dyn SessionStore>) -> InterviewWorkflow {
    let ai = ResilientAi::new(ai);
    InterviewWorkflow::new(
        SessionContext::new(fixed_clock(), store),
        ai.clone(),
        CycleController::headless(ai),
    )
}
