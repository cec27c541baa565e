use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::QuestionId;
use crate::scoring::Score;

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Batch layout: two questions of each difficulty, easiest first.
    pub const BATCH: [Difficulty; 6] = [
        Self::Easy,
        Self::Easy,
        Self::Medium,
        Self::Medium,
        Self::Hard,
        Self::Hard,
    ];

    #[must_use]
    pub fn time_limit_secs(self) -> u32 {
        match self {
            Self::Easy => 20,
            Self::Medium => 60,
            Self::Hard => 120,
        }
    }

    /// Lenient parse: anything that is not easy or medium is hard.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Self::Easy,
            "medium" => Self::Medium,
            _ => Self::Hard,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// A question as produced by a generator, before it joins a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub text: String,
    pub difficulty: Difficulty,
}

impl GeneratedQuestion {
    #[must_use]
    pub fn new(text: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            text: text.into(),
            difficulty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub difficulty: Difficulty,
    pub time_limit_secs: u32,
    pub answer: Option<String>,
    pub score: Option<Score>,
    pub time_spent_secs: u32,
    pub reference_answer: Option<String>,
    /// Set once the question text has been posted to the transcript.
    #[serde(default)]
    pub revealed: bool,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, text: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            id,
            text: text.into(),
            difficulty,
            time_limit_secs: difficulty.time_limit_secs(),
            answer: None,
            score: None,
            time_spent_secs: 0,
            reference_answer: None,
            revealed: false,
        }
    }

    /// Numbers a generated batch 1..=n in order.
    #[must_use]
    pub fn from_batch(batch: Vec<GeneratedQuestion>) -> Vec<Question> {
        batch
            .into_iter()
            .zip(1_u32..)
            .map(|(q, id)| Question::new(QuestionId::new(id), q.text, q.difficulty))
            .collect()
    }

    /// Records the submitted answer; time spent is clamped to the limit.
    pub fn record_answer(&mut self, answer: impl Into<String>, time_spent_secs: u32) {
        self.answer = Some(answer.into());
        self.time_spent_secs = time_spent_secs.min(self.time_limit_secs);
    }

    pub fn record_evaluation(&mut self, score: Score, reference_answer: Option<String>) {
        self.score = Some(score);
        if reference_answer.is_some() {
            self.reference_answer = reference_answer;
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }

    #[must_use]
    pub fn answer_text(&self) -> &str {
        self.answer.as_deref().unwrap_or("")
    }
}
