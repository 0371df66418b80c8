//! Error types for the control plane.
//!
//! This module defines all errors that can occur during pool reconfiguration
//! and token management operations.

use std::fmt;

use thiserror::Error;
use vmpool_core::TokenId;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Why a single change-set entry was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRejection {
    /// The name is neither a pool nor an alias.
    UnknownPoolName(String),
    /// The template value failed the format check.
    InvalidTemplateFormat(String),
    /// The size value is not a non-negative base-10 integer.
    InvalidSizeFormat(String),
}

impl ChangeRejection {
    /// The pool name as it was submitted.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::UnknownPoolName(name)
            | Self::InvalidTemplateFormat(name)
            | Self::InvalidSizeFormat(name) => name,
        }
    }
}

impl fmt::Display for ChangeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPoolName(name) => write!(f, "unknown pool {name}"),
            Self::InvalidTemplateFormat(name) => write!(f, "invalid template for {name}"),
            Self::InvalidSizeFormat(name) => write!(f, "invalid size for {name}"),
        }
    }
}

/// Errors that can occur in control plane operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Pool mutation is behind the experimental-features flag.
    #[error("experimental features are disabled")]
    FeatureDisabled,

    /// At least one change-set entry was invalid; nothing was written.
    #[error("{} invalid change(s)", .0.len())]
    InvalidChanges(Vec<ChangeRejection>),

    /// The requested token was not found.
    #[error("token not found: {0:?}")]
    TokenNotFound(TokenId),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] vmpool_store::StoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::FeatureDisabled => 405,
            Self::InvalidChanges(_) => 400,
            Self::TokenNotFound(_) => 404,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Store(vmpool_store::StoreError::Conflict) | Self::Internal(_)
        )
    }
}
