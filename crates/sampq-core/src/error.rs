//! Error types for the query and monitoring stack
//!
//! The variants mirror the failure classes callers need to tell apart:
//! a query that timed out is not a malformed reply, and neither is a
//! user cancellation.

use thiserror::Error;

/// Result type alias for sampq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// No reply arrived before the query deadline
    #[error("Query to {target} timed out after {after_ms} ms")]
    Timeout {
        /// Target endpoint ("ip:port")
        target: String,
        /// Configured deadline in milliseconds
        after_ms: u64,
    },

    /// Host could not be turned into an IPv4 address
    #[error("Address resolution failed: {0}")]
    Resolve(String),

    /// Structurally invalid bytes from a remote peer
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Monitoring provider failure
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Invalid input (bad host, port out of policy, unparsable address)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Socket-level errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a timeout error
    pub fn timeout(target: impl std::fmt::Display, after_ms: u64) -> Self {
        Self::Timeout {
            target: target.to_string(),
            after_ms,
        }
    }

    /// Create a resolution error
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve(msg.into())
    }

    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether this error is a query timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether this error is a cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether this error is a parse failure on untrusted input
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}
