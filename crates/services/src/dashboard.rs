use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use interview_core::model::{
    CandidateId, CompletedInterview, ProgressFlags, Session, SessionId, Stage, Status,
};
use interview_core::scoring::Score;
use storage::repository::{SessionStore, StoreCounts};

use crate::error::DashboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Ascending => ord,
            Self::Descending => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletedSort {
    #[default]
    Score,
    Name,
    CompletedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InProgressSort {
    Name,
    #[default]
    LastActivity,
    StartedAt,
}

/// Presentation-agnostic row for a finished interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedListItem {
    pub session_id: SessionId,
    pub candidate_id: CandidateId,
    pub name: String,
    pub email: Option<String>,
    pub final_score: Score,
    pub completed_at: DateTime<Utc>,
    pub questions: usize,
}

impl CompletedListItem {
    #[must_use]
    pub fn from_record(record: &CompletedInterview) -> Self {
        Self {
            session_id: record.session_id.clone(),
            candidate_id: record.candidate.id,
            name: record.candidate.display_name().to_string(),
            email: record.candidate.email.clone(),
            final_score: record.final_score,
            completed_at: record.completed_at,
            questions: record.questions.len(),
        }
    }
}

/// Presentation-agnostic row for an unfinished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InProgressListItem {
    pub session_id: SessionId,
    pub name: String,
    pub email: Option<String>,
    pub stage: Stage,
    pub status: Status,
    pub progress: ProgressFlags,
    /// Milestones reached, as 0..=100.
    pub percent: u8,
    pub answered: usize,
    pub total: usize,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl InProgressListItem {
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let candidate = session.candidate();
        Self {
            session_id: session.id().clone(),
            name: candidate
                .map_or("Unnamed candidate", |c| c.display_name())
                .to_string(),
            email: candidate.and_then(|c| c.email.clone()),
            stage: session.stage(),
            status: session.status(),
            progress: session.progress(),
            percent: session.progress().percent(),
            answered: session.questions().iter().filter(|q| q.is_answered()).count(),
            total: session.questions().len(),
            started_at: session.started_at(),
            last_activity_at: session.last_activity_at(),
        }
    }
}

/// A finished interview with its per-question average.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDetail {
    pub record: CompletedInterview,
    pub question_average: f64,
}

/// Read-only projections over the store for recruiters.
#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn SessionStore>,
}

impl DashboardService {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `DashboardError::Storage` on repository failures.
    pub async fn completed(
        &self,
        filter: &str,
        sort: CompletedSort,
        direction: SortDirection,
    ) -> Result<Vec<CompletedListItem>, DashboardError> {
        let mut items: Vec<CompletedListItem> = self
            .store
            .list_completed()
            .await?
            .iter()
            .filter(|r| r.candidate.matches(filter))
            .map(CompletedListItem::from_record)
            .collect();

        items.sort_by(|a, b| {
            let primary = match sort {
                CompletedSort::Score => a.final_score.cmp(&b.final_score),
                CompletedSort::Name => name_key(&a.name).cmp(&name_key(&b.name)),
                CompletedSort::CompletedAt => a.completed_at.cmp(&b.completed_at),
            };
            direction
                .apply(primary)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(items)
    }

    /// # Errors
    ///
    /// Returns `DashboardError::Storage` on repository failures.
    pub async fn in_progress(
        &self,
        filter: &str,
        sort: InProgressSort,
        direction: SortDirection,
    ) -> Result<Vec<InProgressListItem>, DashboardError> {
        let mut items: Vec<InProgressListItem> = self
            .store
            .get_all()
            .await?
            .iter()
            .filter(|s| match s.candidate() {
                Some(c) => c.matches(filter),
                None => filter.trim().is_empty(),
            })
            .map(InProgressListItem::from_session)
            .collect();

        items.sort_by(|a, b| {
            let primary = match sort {
                InProgressSort::Name => name_key(&a.name).cmp(&name_key(&b.name)),
                InProgressSort::LastActivity => a.last_activity_at.cmp(&b.last_activity_at),
                InProgressSort::StartedAt => a.started_at.cmp(&b.started_at),
            };
            direction
                .apply(primary)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(items)
    }

    /// # Errors
    ///
    /// Returns `DashboardError::Storage` when the candidate has no finished
    /// interview or the repository fails.
    pub async fn candidate(&self, candidate_id: CandidateId) -> Result<CandidateDetail, DashboardError> {
        let record = self.store.get_completed(candidate_id).await?;
        let question_average = record.question_average();
        Ok(CandidateDetail {
            record,
            question_average,
        })
    }

    /// # Errors
    ///
    /// Returns `DashboardError::Storage` on repository failures.
    pub async fn counts(&self) -> Result<StoreCounts, DashboardError> {
        Ok(self.store.counts().await?)
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_reverses_ordering() {
        assert_eq!(SortDirection::Ascending.apply(Ordering::Less), Ordering::Less);
        assert_eq!(SortDirection::Descending.apply(Ordering::Less), Ordering::Greater);
    }

    #[test]
    fn name_key_ignores_case_and_padding() {
        assert_eq!(name_key("  Ada Lovelace "), name_key("ada lovelace"));
    }
}
