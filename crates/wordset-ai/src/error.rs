use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("AI API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The model answered, but not in the shape it was asked for.
    #[error("Unexpected completion output: {0}")]
    ModelDelusions(String),

    /// The model reported that it could not produce a result.
    #[error("Generation was not successful: {0}")]
    Unsuccessful(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
