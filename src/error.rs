use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serde JSON error: {0}")]
    SerdeError(String),

    #[error("HTTP client error: {0}")]
    HttpError(String),

    #[error("Transport error (HTTP {status}): {message}")]
    TransportError { status: u16, message: String },

    #[error("{message}")]
    UpstreamError {
        message: String,
        code: Option<String>,
    },

    #[error("Stream protocol error: {0}")]
    StreamProtocolError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Keyring error: {0}")]
    KeyringError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Generation already in progress: {0}")]
    ConcurrentGeneration(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerdeError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
