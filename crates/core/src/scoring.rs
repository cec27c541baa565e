//! Score normalization and the rules that blend question scores with the
//! resume score into a final result.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::Question;

/// Score assigned to blank or "I don't know" style answers.
pub const NON_ANSWER_PENALTY: Score = Score(5);

/// Score used when evaluation cannot be obtained at all.
pub const FALLBACK_SCORE: Score = Score(0);

pub const INTERVIEW_WEIGHT: f64 = 0.8;
pub const RESUME_WEIGHT: f64 = 0.2;

const MAX_SCORE: u8 = 100;

const NON_ANSWER_PHRASES: &[&str] = &[
    "i don't know",
    "i dont know",
    "i do not know",
    "don't know",
    "dont know",
    "idk",
    "no idea",
    "no clue",
    "no answer",
    "not sure",
    "i'm not sure",
    "im not sure",
    "pass",
    "skip",
    "n/a",
    "na",
    "none",
    "no answer provided",
    "no answer provided (time expired)",
];

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("score must be a finite number, got {raw}")]
    NotFinite { raw: f64 },

    #[error("score {value} is out of range 0..=100")]
    OutOfRange { value: u32 },
}

/// A score on the 0–100 scale.
///
/// Only `from_raw` applies the 0–10 rescaling; a `Score` that already exists
/// is never rescaled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Wraps an already-normalized value.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` above 100.
    pub fn new(value: u8) -> Result<Self, ScoreError> {
        if value > MAX_SCORE {
            return Err(ScoreError::OutOfRange {
                value: u32::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Normalizes a raw score reported by an evaluator.
    ///
    /// Values in `(0, 10]` are read as a 0–10 scale and multiplied by ten.
    /// The result is rounded and clamped to 0–100.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::NotFinite` for NaN or infinite input.
    pub fn from_raw(raw: f64) -> Result<Self, ScoreError> {
        if !raw.is_finite() {
            return Err(ScoreError::NotFinite { raw });
        }
        let scaled = if raw > 0.0 && raw <= 10.0 {
            raw * 10.0
        } else {
            raw
        };
        Ok(Self::clamped(scaled))
    }

    fn clamped(value: f64) -> Self {
        let rounded = value.round().clamp(0.0, f64::from(MAX_SCORE));
        // Clamped to 0..=100 above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self(rounded as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = ScoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Returns true for blank answers and the fixed set of non-answer phrases.
///
/// Matching ignores case, surrounding whitespace and trailing punctuation.
#[must_use]
pub fn is_non_answer(answer: &str) -> bool {
    let trimmed = answer
        .trim()
        .trim_end_matches(['.', '!', '?', ',', ';'])
        .trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_lowercase().replace('\u{2019}', "'");
    NON_ANSWER_PHRASES.contains(&lowered.as_str())
}

/// Mean of the question scores; unscored questions count as zero.
#[must_use]
pub fn interview_average(questions: &[Question]) -> f64 {
    if questions.is_empty() {
        return 0.0;
    }
    let total: f64 = questions
        .iter()
        .map(|q| f64::from(q.score.map_or(0, Score::value)))
        .sum();
    // Question batches are small; precision loss is not a concern.
    #[allow(clippy::cast_precision_loss)]
    let count = questions.len() as f64;
    total / count
}

/// `round(average * 0.8 + resume * 0.2)`; a missing resume score counts as zero.
#[must_use]
pub fn blended_final_score(interview_average: f64, resume_score: Option<Score>) -> Score {
    let resume = f64::from(resume_score.map_or(0, Score::value));
    Score::clamped(interview_average * INTERVIEW_WEIGHT + resume * RESUME_WEIGHT)
}

/// Summary text used when the AI summary is unavailable.
#[must_use]
pub fn fallback_summary(question_count: usize, interview_average: f64) -> String {
    format!(
        "Completed {question_count} questions with an average score of {}%.",
        Score::clamped(interview_average).value()
    )
}
