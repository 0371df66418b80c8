//! Pluggable username/password checks.
//!
//! The gateway only ever sees the [`Authenticator`] trait, so a backend can be
//! swapped without touching endpoint logic.

use std::collections::BTreeMap;

use async_trait::async_trait;

/// Trait for checking administrative credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns `true` if the username/password pair is accepted.
    async fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Checks credentials against a fixed set of configured users.
///
/// Passwords are kept only as blake3 digests; digest comparison is
/// constant-time.
pub struct StaticAuthenticator {
    users: BTreeMap<String, blake3::Hash>,
}

impl StaticAuthenticator {
    /// Build from `username -> password` pairs.
    #[must_use]
    pub fn new(users: &BTreeMap<String, String>) -> Self {
        let users = users
            .iter()
            .map(|(user, password)| (user.clone(), blake3::hash(password.as_bytes())))
            .collect();
        Self { users }
    }

    /// Number of configured users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|digest| *digest == blake3::hash(password.as_bytes()))
    }
}

/// Development provider: accepts any non-empty pair whose parts differ.
#[derive(Debug, Default)]
pub struct DummyAuthenticator;

#[async_trait]
impl Authenticator for DummyAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> bool {
        !username.is_empty() && !password.is_empty() && username != password
    }
}

/// A mock authenticator for testing that accepts exactly one pair.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockAuthenticator {
    /// The accepted username.
    pub username: String,
    /// The accepted password.
    pub password: String,
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockAuthenticator {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "s3cr3t".to_string(),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}
