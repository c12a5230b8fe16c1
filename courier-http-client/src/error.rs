//! HTTP Client error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for HTTP client operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// HTTP client errors.
///
/// The wrapper does not invent failures of its own; apart from builder and
/// configuration problems every variant is something the transport or an
/// interceptor produced and is handed back to the caller unchanged.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The request was cancelled through the cancellation registry.
    #[error("Request to {url} was cancelled")]
    Cancelled {
        /// Registry key of the cancelled request.
        url: String,
    },

    /// Request timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Request building error.
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// Non-success status returned while status validation is enabled.
    #[error("Response error: {status} - {message}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Response body could not be decoded as text.
    #[error("Failed to decode response body: {0}")]
    Body(String),

    /// Interceptor error.
    #[error("Interceptor error: {0}")]
    Interceptor(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl HttpClientError {
    /// Build an interceptor error from any displayable message.
    pub fn interceptor(message: impl Into<String>) -> Self {
        Self::Interceptor(message.into())
    }

    /// Check if this error came from a cancelled request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_)) || matches!(self, Self::Http(e) if e.is_connect())
    }

    /// Get the HTTP status code if this is a response error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for HttpClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
