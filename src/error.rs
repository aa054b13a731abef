//! Error types for backend calls and form rules

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Validation(String),

    #[error("Not signed in")]
    NotSignedIn,
}

impl ApiError {
    /// Network and server failures may succeed on a second attempt;
    /// local form errors will not
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Server { .. })
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
