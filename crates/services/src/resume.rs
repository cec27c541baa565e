use std::path::Path;

use fs_err as fs;
use tracing::debug;

use crate::error::ResumeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeKind {
    Pdf,
    Text,
}

impl ResumeKind {
    /// Picks the kind from the file extension; anything else is rejected.
    ///
    /// # Errors
    ///
    /// Returns `ResumeError::InvalidFileType` for unsupported extensions.
    pub fn from_file_name(file_name: &str) -> Result<Self, ResumeError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt" | "md") => Ok(Self::Text),
            _ => Err(ResumeError::InvalidFileType {
                file_name: file_name.to_string(),
            }),
        }
    }
}

/// An uploaded resume with its extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeDocument {
    pub file_name: String,
    pub kind: ResumeKind,
    pub text: String,
}

impl ResumeDocument {
    /// Extracts text from uploaded bytes.
    ///
    /// # Errors
    ///
    /// Returns `ResumeError` for unsupported types, unreadable content or a
    /// document with no text.
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> Result<Self, ResumeError> {
        let kind = ResumeKind::from_file_name(file_name)?;
        let text = match kind {
            ResumeKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| ResumeError::Unreadable(e.to_string()))?,
            ResumeKind::Text => String::from_utf8(bytes.to_vec())
                .map_err(|e| ResumeError::Unreadable(e.to_string()))?,
        };
        let text = normalize_whitespace(&text);
        if text.is_empty() {
            return Err(ResumeError::Empty);
        }
        debug!(file_name, ?kind, chars = text.len(), "resume text extracted");
        Ok(Self {
            file_name: file_name.to_string(),
            kind,
            text,
        })
    }

    /// Reads and extracts a resume from disk.
    ///
    /// # Errors
    ///
    /// Returns `ResumeError` when the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ResumeError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        ResumeKind::from_file_name(&file_name)?;
        let bytes = fs::read(path).map_err(|e| ResumeError::Unreadable(e.to_string()))?;
        Self::from_bytes(&file_name, &bytes)
    }
}

/// Collapses runs of blank lines and trims each line.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_extension() {
        assert_eq!(ResumeKind::from_file_name("cv.PDF").unwrap(), ResumeKind::Pdf);
        assert_eq!(ResumeKind::from_file_name("cv.txt").unwrap(), ResumeKind::Text);
        assert!(matches!(
            ResumeKind::from_file_name("cv.docx"),
            Err(ResumeError::InvalidFileType { .. })
        ));
        assert!(ResumeKind::from_file_name("resume").is_err());
    }

    #[test]
    fn text_resume_is_normalized() {
        let doc = ResumeDocument::from_bytes("cv.txt", b"  Name: Ada  \n\n\n\nRust\n").unwrap();
        assert_eq!(doc.text, "Name: Ada\n\nRust");
    }

    #[test]
    fn blank_resume_is_rejected() {
        assert!(matches!(
            ResumeDocument::from_bytes("cv.txt", b"  \n \n"),
            Err(ResumeError::Empty)
        ));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "Grace Hopper\ngrace@navy.mil").unwrap();
        let doc = ResumeDocument::from_path(&path).unwrap();
        assert_eq!(doc.file_name, "resume.txt");
        assert!(doc.text.contains("grace@navy.mil"));
    }
}
