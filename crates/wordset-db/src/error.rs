use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Atomic block started inside another atomic block")]
    NestedTransaction,

    #[error("Rollback failed after error ({cause}): {source}")]
    Rollback {
        cause: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] wordset_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
