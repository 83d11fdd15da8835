//! Error types for the Parley client.

use thiserror::Error;

/// A shared error type for the entire Parley client.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    /// The server rejected the bearer token (HTTP 401 on a token-bearing
    /// endpoint). The session manager is the only component that reacts to
    /// this by clearing the session. A 401 from the credential endpoints is
    /// an ordinary `Api` error instead.
    #[error("Not authenticated")]
    Unauthorized,

    /// Non-401 HTTP error reported by the server.
    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connect, timeout, malformed response body).
    #[error("Network error: {0}")]
    Network(String),

    /// Input rejected before any network call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persisted client state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Creates an Api error from a status code and server-provided message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is the centralized 401 variant.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Check if this error was raised locally, before any request went out.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for ParleyError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ParleyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ParleyError>`.
pub type Result<T> = std::result::Result<T, ParleyError>;
