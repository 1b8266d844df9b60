//! Error types for the lineage pipeline.
//!
//! Each pipeline stage has its own typed error so callers can tell a failed
//! repository call from a failed generation call. At the command-line
//! boundary everything is converted into [`AppError`].

pub use masterror::{AppError, AppResult};
use thiserror::Error;

use crate::classify::Category;

/// Failure while listing or fetching scripts from a repository.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Repository location could not be interpreted
    #[error("Invalid repository reference '{0}'")]
    InvalidReference(String),
    /// `git clone` could not be started or exited unsuccessfully
    #[error("Error cloning repository: {0}")]
    Clone(String),
    /// Hosting API answered with a non-success status
    #[error("Repository API error {status}: {body}")]
    Api { status: u16, body: String },
    /// Network-level failure talking to the hosting API
    #[error("Repository request failed: {0}")]
    Transport(String),
    /// Hosting API answered with a body that could not be decoded
    #[error("Unexpected repository API response: {0}")]
    Decode(String),
    /// Local working copy could not be read
    #[error("Failed to read '{path}': {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error
    }
}

/// Failure of a single text-generation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("{0}")]
    Transport(String),
    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status:   u16,
        body:     String
    },
    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),
    #[error("Invalid response from {provider}: {message}")]
    Decode {
        provider: &'static str,
        message:  String
    }
}

/// Failure inside the three-request classification sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category} request failed: {source}")]
pub struct ClassificationError {
    pub category: Category,
    #[source]
    pub source:   GenerationError
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::InvalidReference(_) => AppError::bad_request(err.to_string()),
            other => AppError::service(other.to_string())
        }
    }
}

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create terminal I/O error
pub fn terminal_error(source: std::io::Error) -> AppError {
    AppError::internal(format!("Terminal I/O failed: {}", source))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Describe a `reqwest` failure with the most useful detail first.
pub fn describe_http_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("Request timeout: {}", err)
    } else if err.is_connect() {
        format!("Connection failed: {}", err)
    } else if err.is_status() {
        format!("HTTP error {}: {}", err.status().unwrap_or_default(), err)
    } else {
        err.to_string()
    }
}
