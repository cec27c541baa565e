mod context;
mod cycle;
mod progress;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use context::{DEFAULT_SAVE_DEBOUNCE_MS, SessionContext};
pub use cycle::{CycleController, CycleTimings, GateOutcome};
pub use progress::SessionProgress;
pub use workflow::{FinalReport, InterviewWorkflow, Presented};
