use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use interview_core::model::CandidateId;
use services::{CompletedSort, InProgressSort, SortDirection};

#[derive(Parser, Debug)]
#[command(name = "interview")]
#[command(about = "AI-assisted technical interviews with a recruiter dashboard", long_about = None)]
pub struct Cli {
    /// SQLite database URL or path (overrides INTERVIEW_DB_URL)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// JSON mirror file (overrides INTERVIEW_MIRROR_PATH)
    #[arg(long, global = true, conflicts_with = "no_mirror")]
    pub mirror: Option<PathBuf>,

    /// Run without the JSON mirror
    #[arg(long, global = true)]
    pub no_mirror: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an interview in the terminal, resuming an unfinished one if present
    Interview {
        /// Resume to upload (PDF or plain text)
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Start over even if an unfinished session exists
        #[arg(long)]
        fresh: bool,
    },
    /// List finished and unfinished interviews
    Dashboard {
        /// Case-insensitive match on name or email
        #[arg(long, default_value = "")]
        filter: String,

        #[arg(long, value_enum, default_value_t = SortKey::Score)]
        sort: SortKey,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,

        /// Show unfinished sessions instead of finished interviews
        #[arg(long)]
        in_progress: bool,

        /// Show one finished interview in detail
        #[arg(long)]
        candidate: Option<CandidateId>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Score,
    Name,
    CompletedAt,
    LastActivity,
    StartedAt,
}

impl SortKey {
    /// Keys that only apply to the other list fall back to its default.
    pub fn completed(self) -> CompletedSort {
        match self {
            Self::Name => CompletedSort::Name,
            Self::CompletedAt => CompletedSort::CompletedAt,
            Self::Score | Self::LastActivity | Self::StartedAt => CompletedSort::Score,
        }
    }

    pub fn in_progress(self) -> InProgressSort {
        match self {
            Self::Name => InProgressSort::Name,
            Self::StartedAt => InProgressSort::StartedAt,
            Self::Score | Self::CompletedAt | Self::LastActivity => InProgressSort::LastActivity,
        }
    }
}

pub fn direction(asc: bool) -> SortDirection {
    if asc {
        SortDirection::Ascending
    } else {
        SortDirection::Descending
    }
}
