//! Administrative credential checks for vmpool.
//!
//! This crate provides the credential-check capability behind the gateway's
//! administrative endpoints:
//!
//! - HTTP Basic credential parsing
//! - A pluggable [`Authenticator`] trait
//! - Static (configured users) and dummy (development) providers
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Gateway        │────▶│  Authenticator   │
//! │   (AuthGate)     │     │  (trait)         │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                    ┌──────────────┴──────────────┐
//!           ┌────────▼─────────┐         ┌─────────▼────────┐
//!           │StaticAuthenticator│        │DummyAuthenticator│
//!           │ (configured users)│        │ (development)    │
//!           └──────────────────┘         └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use vmpool_auth::{build_authenticator, AuthConfig, AuthProviderKind, Credentials};
//!
//! # async fn example() {
//! let mut config = AuthConfig::default();
//! config.enabled = true;
//! config.provider = AuthProviderKind::Static;
//! config.users.insert("admin".to_string(), "s3cr3t".to_string());
//!
//! let authenticator = build_authenticator(&config);
//!
//! // In a request handler:
//! let creds = Credentials::from_basic_header("Basic YWRtaW46czNjcjN0").unwrap();
//! assert!(authenticator.authenticate(&creds.username, &creds.password).await);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod authenticator;
pub mod credentials;
pub mod error;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

pub use authenticator::{Authenticator, DummyAuthenticator, StaticAuthenticator};
pub use credentials::Credentials;
pub use error::{AuthError, Result};

#[cfg(any(test, feature = "test-utils"))]
pub use authenticator::MockAuthenticator;

/// Which credential backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProviderKind {
    /// Users listed in the configuration.
    #[default]
    Static,
    /// Accept any differing username/password pair. Development only.
    Dummy,
}

/// Configuration for administrative authentication.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Whether the token endpoints are served at all.
    #[serde(default)]
    pub enabled: bool,
    /// Credential backend.
    #[serde(default)]
    pub provider: AuthProviderKind,
    /// `username -> password` pairs for the static provider.
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

/// Build the configured credential backend.
#[must_use]
pub fn build_authenticator(config: &AuthConfig) -> Arc<dyn Authenticator> {
    match config.provider {
        AuthProviderKind::Static => {
            if config.enabled && config.users.is_empty() {
                tracing::warn!("Static auth provider has no users; every login will fail");
            }
            Arc::new(StaticAuthenticator::new(&config.users))
        }
        AuthProviderKind::Dummy => {
            tracing::warn!("Dummy auth provider enabled - do not use in production");
            Arc::new(DummyAuthenticator)
        }
    }
}
