//! Core types and utilities for vmpool.
//!
//! This crate provides the foundational types used throughout the vmpool control plane:
//!
//! - **Identifiers**: Strongly-typed token identifiers and their parse errors
//!
//! # Example
//!
//! ```
//! use vmpool_core::TokenId;
//!
//! // Generate a fresh bearer token id
//! let token_id = TokenId::generate();
//! assert_eq!(token_id.as_str().len(), 32);
//!
//! // Wrap an id received from a request path
//! let parsed = TokenId::new("mytoken").unwrap();
//! assert!(!parsed.is_well_formed());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{IdError, TokenId, TOKEN_ID_LEN};
