use serde::{Deserialize, Serialize};

use crate::model::candidate::IdentityField;
use crate::scoring::Score;

/// Structured result of analyzing a resume.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub summary: String,
    pub score: Option<Score>,
}

impl ResumeAnalysis {
    #[must_use]
    pub fn identity(&self, field: IdentityField) -> Option<&str> {
        let value = match field {
            IdentityField::Name => self.name.as_deref(),
            IdentityField::Email => self.email.as_deref(),
            IdentityField::Phone => self.phone.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Summary text with strengths and improvement areas appended as lists.
    #[must_use]
    pub fn detailed_summary(&self) -> String {
        let mut out = self.summary.trim().to_string();
        if !self.strengths.is_empty() {
            out.push_str("\n\nStrengths:");
            for s in &self.strengths {
                out.push_str("\n- ");
                out.push_str(s);
            }
        }
        if !self.weaknesses.is_empty() {
            out.push_str("\n\nAreas for improvement:");
            for w in &self.weaknesses {
                out.push_str("\n- ");
                out.push_str(w);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detailed_summary_lists_strengths_and_weaknesses() {
        let analysis = ResumeAnalysis {
            summary: "Backend engineer.".into(),
            strengths: vec!["Rust".into()],
            weaknesses: vec!["Frontend".into()],
            ..ResumeAnalysis::default()
        };
        assert_eq!(
            analysis.detailed_summary(),
            "Backend engineer.\n\nStrengths:\n- Rust\n\nAreas for improvement:\n- Frontend"
        );
    }

    #[test]
    fn blank_identity_is_absent() {
        let analysis = ResumeAnalysis {
            email: Some("  ".into()),
            ..ResumeAnalysis::default()
        };
        assert_eq!(analysis.identity(IdentityField::Email), None);
    }
}
