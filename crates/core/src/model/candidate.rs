use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::CandidateId;
use crate::scoring::Score;

//
// ─── IDENTITY FIELDS ───────────────────────────────────────────────────────────
//

/// Contact details the interview cannot start without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityField {
    Name,
    Email,
    Phone,
}

impl IdentityField {
    /// Fixed order in which missing fields are solicited.
    pub const ORDER: [IdentityField; 3] = [Self::Name, Self::Email, Self::Phone];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Full Name",
            Self::Email => "Email Address",
            Self::Phone => "Phone Number",
        }
    }

    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Name => "What is your full name?",
            Self::Email => "What is your email address?",
            Self::Phone => "What is your phone number?",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── CANDIDATE ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resume_file_name: String,
    /// Detailed resume summary shown to recruiters.
    pub resume_text: String,
    pub resume_score: Option<Score>,
    pub resume_strengths: Vec<String>,
    pub resume_weaknesses: Vec<String>,
}

impl Candidate {
    #[must_use]
    pub fn new(id: CandidateId, resume_file_name: impl Into<String>) -> Self {
        Self {
            id,
            name: None,
            email: None,
            phone: None,
            resume_file_name: resume_file_name.into(),
            resume_text: String::new(),
            resume_score: None,
            resume_strengths: Vec::new(),
            resume_weaknesses: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(&self, field: IdentityField) -> Option<&str> {
        let value = match field {
            IdentityField::Name => self.name.as_deref(),
            IdentityField::Email => self.email.as_deref(),
            IdentityField::Phone => self.phone.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Stores a trimmed value; blank input clears the field.
    pub fn set_field(&mut self, field: IdentityField, value: &str) {
        let trimmed = value.trim();
        let value = (!trimmed.is_empty()).then(|| trimmed.to_string());
        match field {
            IdentityField::Name => self.name = value,
            IdentityField::Email => self.email = value,
            IdentityField::Phone => self.phone = value,
        }
    }

    /// Fields still missing, in solicitation order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<IdentityField> {
        IdentityField::ORDER
            .into_iter()
            .filter(|f| self.field(*f).is_none())
            .collect()
    }

    #[must_use]
    pub fn has_identity(&self) -> bool {
        self.missing_fields().is_empty()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.field(IdentityField::Name).unwrap_or("Unnamed candidate")
    }

    /// Case-insensitive substring match on name or email.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [IdentityField::Name, IdentityField::Email]
            .into_iter()
            .filter_map(|f| self.field(f))
            .any(|v| v.to_lowercase().contains(&needle))
    }
}
