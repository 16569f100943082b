use thiserror::Error;

use crate::model::{BatchError, QuestionError, SessionStateError, UsernameError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    SessionState(#[from] SessionStateError),
    #[error(transparent)]
    Username(#[from] UsernameError),
}
