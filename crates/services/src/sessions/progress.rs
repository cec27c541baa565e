use interview_core::model::{Session, Stage, Status};

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub stage: Stage,
    pub status: Status,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    /// Milestone progress, 0..=100 in steps of 25.
    pub percent: u8,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn of(session: &Session) -> Self {
        let total = session.questions().len();
        let answered = session.questions().iter().filter(|q| q.is_answered()).count();
        Self {
            stage: session.stage(),
            status: session.status(),
            total,
            answered,
            remaining: total - answered,
            percent: session.progress().percent(),
            is_complete: session.is_completed(),
        }
    }
}
