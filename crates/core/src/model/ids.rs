use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const SESSION_ID_PREFIX: &str = "interview_";
const SESSION_SUFFIX_LEN: usize = 9;

/// Identifier of one interview session.
///
/// Generated once when the session is created and stable for its lifetime:
/// `interview_<unix millis>_<9 lowercase alphanumerics>`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh identifier stamped with `now`.
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(SESSION_SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        Self(format!(
            "{SESSION_ID_PREFIX}{}_{suffix}",
            now.timestamp_millis()
        ))
    }

    /// Wraps an identifier read back from storage.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the value is blank.
    pub fn new(raw: impl Into<String>) -> Result<Self, ParseIdError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ParseIdError {
                kind: "SessionId".to_string(),
            });
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a candidate; keys the completed partition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(Uuid);

impl CandidateId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

/// Position-derived identifier of a question within its batch (1-based).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(u32);

impl QuestionId {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Monotonic identifier of a transcript entry within one session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Debug for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CandidateId({})", self.0)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

// ─── Display Implementations ────────────────────────────────────────────────

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ────────────────────────────────────────────────

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} format", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for SessionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for CandidateId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(CandidateId)
            .map_err(|_| ParseIdError {
                kind: "CandidateId".to_string(),
            })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn generated_session_id_has_timestamp_and_suffix() {
        let id = SessionId::generate(fixed_now());
        let rest = id.as_str().strip_prefix("interview_").unwrap();
        let (millis, suffix) = rest.split_once('_').unwrap();
        assert_eq!(millis, fixed_now().timestamp_millis().to_string());
        assert_eq!(suffix.len(), 9);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn generated_session_ids_differ() {
        let a = SessionId::generate(fixed_now());
        let b = SessionId::generate(fixed_now());
        assert_ne!(a, b);
    }

    #[test]
    fn blank_session_id_is_rejected() {
        assert!("  ".parse::<SessionId>().is_err());
    }

    #[test]
    fn candidate_id_roundtrips_through_display() {
        let original = CandidateId::generate();
        let parsed: CandidateId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn candidate_id_from_str_invalid() {
        assert!("not-a-uuid".parse::<CandidateId>().is_err());
    }

    #[test]
    fn message_id_next_is_monotonic() {
        let id = MessageId::new(7);
        assert_eq!(id.next(), MessageId::new(8));
        assert_eq!(MessageId::new(u64::MAX).next(), MessageId::new(u64::MAX));
    }
}
