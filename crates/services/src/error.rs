//! Shared error types for the services crate.

use thiserror::Error;

use interview_core::model::SessionStateError;
use storage::mirror::MirrorError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by AI collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI collaborator is not configured")]
    Disabled,
    #[error("AI returned an empty response")]
    EmptyResponse,
    #[error("AI request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("could not parse AI response: {0}")]
    Parse(String),
    #[error("AI request failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<AiError> },
}

/// Errors emitted while reading a resume document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResumeError {
    #[error("unsupported resume file type: {file_name}")]
    InvalidFileType { file_name: String },
    #[error("resume file could not be read: {0}")]
    Unreadable(String),
    #[error("resume contains no readable text")]
    Empty,
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no active session")]
    NoActiveSession,
    #[error(transparent)]
    State(#[from] SessionStateError),
    #[error(transparent)]
    Resume(#[from] ResumeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by dashboard projections.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Mirror(#[from] MirrorError),
}
