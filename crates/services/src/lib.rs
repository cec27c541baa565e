#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod resume;
pub mod sessions;
pub mod voice;

pub use interview_core::Clock;

pub use app_services::{AppServices, ai_from_env};
pub use dashboard::{CompletedSort, DashboardService, InProgressSort, SortDirection};
pub use error::{AiError, AppServicesError, DashboardError, ResumeError, SessionError};
pub use sessions::{FinalReport, InterviewWorkflow, SessionContext};
