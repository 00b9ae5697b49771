//! Error types for trait operations.

use thiserror::Error;

/// Messages that indicate a transient failure at the ledger or network layer.
const TRANSIENT_PATTERNS: &[&str] = &[
    "connection refused",
    "connection reset",
    "timeout",
    "timed out",
    "temporary failure",
    "network error",
    "eof",
];

const NONCE_PATTERNS: &[&str] = &["nonce too low", "replacement transaction underpriced"];

/// Common error type for trait operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TraitError {
    /// Connection to external service failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation timed out
    #[error("timeout")]
    Timeout,

    /// Rate limited
    #[error("rate limited")]
    RateLimited,

    /// Transaction nonce conflicted with a pending one
    #[error("nonce conflict: {0}")]
    NonceConflict(String),

    /// Ledger rejected the transaction
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// Requested resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Source not available
    #[error("source not available: {0}")]
    SourceNotAvailable(String),

    /// Parse/deserialization error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Database error
    #[error("database error: {0}")]
    DatabaseError(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl TraitError {
    /// Returns true if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TraitError::ConnectionFailed(_)
                | TraitError::Timeout
                | TraitError::RateLimited
                | TraitError::NonceConflict(_)
        )
    }

    /// Classifies a raw transport or node error message.
    ///
    /// Unknown messages map to [`TraitError::Internal`], which is not retried.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if NONCE_PATTERNS.iter().any(|p| lower.contains(p)) {
            TraitError::NonceConflict(message)
        } else if lower.contains("revert") {
            TraitError::Reverted(message)
        } else if lower.contains("rate limit") || lower.contains("too many requests") {
            TraitError::RateLimited
        } else if TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p)) {
            TraitError::ConnectionFailed(message)
        } else {
            TraitError::Internal(message)
        }
    }
}

impl From<std::io::Error> for TraitError {
    fn from(e: std::io::Error) -> Self {
        TraitError::IoError(e.to_string())
    }
}

impl From<serde_json::Error> for TraitError {
    fn from(e: serde_json::Error) -> Self {
        TraitError::SerializationError(e.to_string())
    }
}
