//! HTTP client error types

use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network request failed
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Only http and https can be fetched
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Invalid proxy configuration
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    /// HTTP error status
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),
}

impl HttpError {
    /// Check if the request was abandoned because it took too long
    pub fn is_timeout(&self) -> bool {
        match self {
            HttpError::Timeout(_) => true,
            HttpError::RequestFailed(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// HTTP status code, when the server answered at all
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            HttpError::HttpStatus { status, .. } => Some(*status),
            HttpError::RequestFailed(e) => e.status(),
            _ => None,
        }
    }
}
