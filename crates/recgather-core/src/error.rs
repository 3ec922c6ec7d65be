//! Error types for recgather.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every recgather crate.
///
/// None of these errors ever reach the transport layer: the aggregator and the
/// fragment handler log and drop them per fragment. They surface to callers only
/// through configuration loading and `PendingResult::wait`.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecgatherError {
    /// A fragment field could not be decoded
    #[error("Decode error: field '{field}' - {message}")]
    Decode { field: String, message: String },

    /// The fragment store rejected or could not serve an operation
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller waiting on a query stopped waiting before a result arrived
    #[error("Timed out waiting for result '{key}'")]
    Timeout { key: String },

    /// The registry dropped the waiter without releasing it
    #[error("Waiter '{key}' was closed without a result")]
    WaiterClosed { key: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecgatherError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Decode error
    pub fn decode(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a Store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Check if this is a Store error
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Check if this is a Timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RecgatherError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RecgatherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RecgatherError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, RecgatherError>`.
pub type Result<T> = std::result::Result<T, RecgatherError>;
