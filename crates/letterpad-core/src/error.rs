//! Error types for the Letterpad application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Letterpad application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum LetterpadError {
    /// A bearer credential was rejected by a remote API (expired or revoked).
    /// Drive operations recover from this with a single token refresh; anywhere
    /// else it is surfaced to the caller.
    #[error("Authorization expired: {0}")]
    AuthExpired(String),

    /// The identity provider rejected a session refresh. Never retried; the
    /// session must be torn down and the user re-authenticated.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Transport or HTTP failure talking to a remote store.
    #[error("Remote I/O error: {message}")]
    RemoteIo { message: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Durable local storage failure (key-value file)
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

impl LetterpadError {
    /// Creates an AuthExpired error
    pub fn auth_expired(message: impl Into<String>) -> Self {
        Self::AuthExpired(message.into())
    }

    /// Creates a SessionExpired error
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::SessionExpired(message.into())
    }

    /// Creates a RemoteIo error
    pub fn remote_io(message: impl Into<String>) -> Self {
        Self::RemoteIo {
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
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

    /// Check if this is an AuthExpired error
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired(_))
    }

    /// Check if this is a SessionExpired error
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }

    /// Check if this is a RemoteIo error
    pub fn is_remote_io(&self) -> bool {
        matches!(self, Self::RemoteIo { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<std::io::Error> for LetterpadError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for LetterpadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for LetterpadError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for LetterpadError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteIo {
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, LetterpadError>`.
pub type Result<T> = std::result::Result<T, LetterpadError>;
