use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    candidate::Candidate, chat::ChatMessage, ids::SessionId, question::Question,
};
use crate::scoring::{Score, interview_average};

/// Record written once when a session completes; what the dashboard reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedInterview {
    pub session_id: SessionId,
    pub candidate: Candidate,
    pub questions: Vec<Question>,
    pub final_score: Score,
    pub final_summary: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub chat_history: Vec<ChatMessage>,
}

impl CompletedInterview {
    /// Mean question score, without the resume weighting.
    #[must_use]
    pub fn question_average(&self) -> f64 {
        interview_average(&self.questions)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| !q.answer_text().trim().is_empty())
            .count()
    }
}
