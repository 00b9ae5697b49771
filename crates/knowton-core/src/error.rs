//! Error types for the KnowTon bonding workspace.
//!
//! The taxonomy separates failures the caller must fix (validation, state,
//! allocation) from failures at the ledger boundary, which may be retried.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::TrancheKind;

/// A specialized Result type for KnowTon operations.
pub type KnowtonResult<T> = Result<T, KnowtonError>;

/// The main error type for KnowTon operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KnowtonError {
    /// Malformed or out-of-range input, rejected before any external call.
    #[error("Validation error: {reason}")]
    Validation {
        /// Description of what's invalid.
        reason: String,
    },

    /// Investment would overflow the tranche allocation ceiling.
    #[error(
        "Allocation exceeded for {tranche} tranche: requested {requested}, remaining {remaining}"
    )]
    AllocationExceeded {
        /// Tranche that would overflow.
        tranche: TrancheKind,
        /// Amount requested by the investor.
        requested: Decimal,
        /// Allocation still available in the tranche.
        remaining: Decimal,
    },

    /// The external ledger was unreachable, timed out, or reverted.
    #[error("Ledger call '{operation}' failed: {reason}")]
    LedgerCall {
        /// Ledger operation that failed.
        operation: String,
        /// Description of the failure.
        reason: String,
        /// Whether the whole operation may be retried by the caller.
        retryable: bool,
    },

    /// Operation attempted against a bond in the wrong status.
    #[error("State error: {reason}")]
    State {
        /// Description of the conflicting state.
        reason: String,
    },

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Local persistence failed.
    #[error("Storage error: {reason}")]
    Storage {
        /// Description of the failure.
        reason: String,
    },

    /// Valuation oracle failed.
    #[error("Oracle error: {reason}")]
    Oracle {
        /// Description of the failure.
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of the configuration error.
        reason: String,
    },
}

impl KnowtonError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Creates a validation error for an amount outside the decimal range.
    #[must_use]
    pub fn overflow(what: impl std::fmt::Display) -> Self {
        Self::Validation {
            reason: format!("{what} exceeds the supported decimal range"),
        }
    }

    /// Creates a state error.
    #[must_use]
    pub fn state(reason: impl Into<String>) -> Self {
        Self::State {
            reason: reason.into(),
        }
    }

    /// Creates a ledger call error.
    #[must_use]
    pub fn ledger_call(operation: impl Into<String>, reason: impl Into<String>, retryable: bool) -> Self {
        Self::LedgerCall {
            operation: operation.into(),
            reason: reason.into(),
            retryable,
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a storage error.
    #[must_use]
    pub fn storage(reason: impl Into<String>) -> Self {
        Self::Storage {
            reason: reason.into(),
        }
    }

    /// Creates an oracle error.
    #[must_use]
    pub fn oracle(reason: impl Into<String>) -> Self {
        Self::Oracle {
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Returns true if the caller may retry the whole operation.
    ///
    /// Validation, allocation and state errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LedgerCall { retryable: true, .. })
    }
}
