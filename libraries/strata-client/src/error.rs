//! Error types for the catalog client.

use thiserror::Error;

/// Errors that can occur when talking to the song catalog.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Catalog returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Requested song does not exist
    #[error("Song not found: {0}")]
    NotFound(String),

    /// Invalid catalog or chunk URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse catalog response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Catalog is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

/// Result type for catalog client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
