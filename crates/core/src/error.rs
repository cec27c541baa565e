use thiserror::Error;

use crate::model::{ParseIdError, SessionStateError};
use crate::scoring::ScoreError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    SessionState(#[from] SessionStateError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
