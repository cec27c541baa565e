mod candidate;
mod chat;
mod completed;
mod ids;
mod question;
mod resume;
mod session;

pub use ids::{CandidateId, MessageId, ParseIdError, QuestionId, SessionId};

pub use candidate::{Candidate, IdentityField};
pub use chat::{ChatMessage, Sender, Transcript};
pub use completed::CompletedInterview;
pub use question::{Difficulty, GeneratedQuestion, Question};
pub use resume::ResumeAnalysis;
pub use session::{
    FieldOutcome, ProgressFlags, ResumeOutcome, Session, SessionStateError, Stage, Status,
    SubmitKind, SubmitOutcome, TickOutcome,
};
