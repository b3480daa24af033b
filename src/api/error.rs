//! API error types

use thiserror::Error;

/// Failure of a single request against the geo REST API.
///
/// `Display` of [`ApiError::Status`] is the server's message verbatim so it
/// can be shown beneath a form or in a banner without further formatting.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Could not reach the server or read its response
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Success status but the body was not JSON
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL or path could not be turned into a request URL
    #[error("Invalid URL: {0}")]
    Url(String),
}

impl ApiError {
    /// HTTP status for server-side failures
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for API calls
pub type ApiResult<T> = Result<T, ApiError>;
