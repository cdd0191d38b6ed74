//! Error types for chatdesk-api

use thiserror::Error;

/// Result type alias using chatdesk-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the widget server
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Server-sent events error
    #[error("SSE error: {0}")]
    Sse(String),

    /// Request did not finish before the client-side deadline
    #[error("Request timed out")]
    Timeout,

    /// Local file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this error means the server could not be reached at all
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_request(),
            Error::Sse(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("connect") || msg.contains("network") || msg.contains("stream ended")
            }
            _ => false,
        }
    }

    /// Whether this error is a client-side timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let e = Error::api(500, "boom");
        assert_eq!(e.to_string(), "Server error (500): boom");
    }

    #[test]
    fn test_timeout_detection() {
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::Sse("reset".into()).is_timeout());
        assert!(!Error::api(504, "gateway").is_timeout());
    }

    #[test]
    fn test_sse_connection_errors() {
        assert!(Error::Sse("Failed to connect to server".into()).is_connection_error());
        assert!(Error::Sse("NetworkError when attempting to fetch".into()).is_connection_error());
        assert!(!Error::Sse("invalid content type".into()).is_connection_error());
    }

    #[test]
    fn test_non_transport_errors_are_not_connection_errors() {
        assert!(!Error::Timeout.is_connection_error());
        assert!(!Error::api(500, "internal").is_connection_error());
        assert!(!Error::InvalidUrl("nope".into()).is_connection_error());
    }
}
