use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    StudySet,
    Definition,
    Task,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::StudySet => write!(f, "study set"),
            Resource::Definition => write!(f, "definition"),
            Resource::Task => write!(f, "task"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(Resource),

    #[error("You don't have permission to modify this study set")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Too many fill tasks in progress, try again later")]
    Overloaded,

    #[error("Repository failed: {0}")]
    Repository(#[from] wordset_db::Error),

    #[error("Generation failed: {0}")]
    Generation(#[from] wordset_ai::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<wordset_core::Error> for ServiceError {
    fn from(err: wordset_core::Error) -> Self {
        match err {
            wordset_core::Error::Validation(msg) => ServiceError::Validation(msg),
            other => ServiceError::Repository(other.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
