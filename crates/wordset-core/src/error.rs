use thiserror::Error;

use crate::TaskState;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid task transition: {from} -> {to}")]
    InvalidTransition { from: TaskState, to: TaskState },

    #[error("Unknown task state: {0}")]
    UnknownTaskState(String),

    #[error("Unknown failure reason: {0}")]
    UnknownFailureReason(String),
}

pub type Result<T> = std::result::Result<T, Error>;
