//! Client error types

use thiserror::Error;

/// Result type for client core operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced to the connection layer
#[derive(Error, Debug)]
pub enum ClientError {
    /// The byte source ended before the declared content length was read.
    /// The connection's framing can no longer be trusted; callers must tear
    /// the connection down rather than retry.
    #[error("Truncated source: expected {expected} bytes, received {received}")]
    TruncatedSource {
        /// Bytes the frame header promised
        expected: u64,
        /// Bytes actually obtained before the source ran dry
        received: u64,
    },

    /// IO failure while reading the byte source
    #[error("IO error: {source}")]
    Io {
        /// Underlying IO error
        #[from]
        source: std::io::Error,
    },

    /// Subscription rejected at registration time
    #[error("Invalid registration: {message}")]
    InvalidRegistration {
        /// What was wrong with the registration
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },
}

impl ClientError {
    /// Create a truncated-source error
    pub fn truncated(expected: u64, received: u64) -> Self {
        Self::TruncatedSource { expected, received }
    }

    /// Create an invalid-registration error
    pub fn invalid_registration(message: impl Into<String>) -> Self {
        Self::InvalidRegistration {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
