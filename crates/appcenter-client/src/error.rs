//! Error types for appcenter-client

use thiserror::Error;

/// Errors raised before or while exchanging a request with App Center.
///
/// Non-success HTTP statuses are not errors at this layer; they come back
/// as a [`crate::RemoteResponse`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection, TLS or body-read failure
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// Base URL could not be parsed or cannot carry path segments
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Request body serialization failed
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "HTTP transport error: connection refused");

        let err = ClientError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid base URL"));
    }
}
