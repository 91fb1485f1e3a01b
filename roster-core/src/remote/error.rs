//! Remote API error types.

use std::time::Duration;

use thiserror::Error;

/// Every way a call to the backend can fail.
///
/// The remote data source never swallows one of these; falling back is the
/// sync controller's job.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    /// DNS, refused connection, TLS and other transport failures
    #[error("Connection error: {0}")]
    Transport(String),

    /// The request exceeded its time budget and was aborted
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status
    #[error("Server returned {code}: {message}")]
    HttpStatus { code: u16, message: String },

    /// The response body did not have the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Timeout(_))
    }

    /// Status code for `HttpStatus` failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RemoteError::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}
