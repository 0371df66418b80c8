//! Error types for the storage layer.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("record not found")]
    NotFound,

    /// A transaction kept conflicting with concurrent writers.
    #[error("transaction conflict: retries exhausted")]
    Conflict,

    /// A pool alias points at a pool that is not declared.
    #[error("alias {alias} refers to unknown pool {target}")]
    InvalidAlias {
        /// The alias name.
        alias: String,
        /// The pool the alias was declared to resolve to.
        target: String,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}
