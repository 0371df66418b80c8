//! HTTP Basic credential parsing.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{AuthError, Result};

/// A username/password pair presented by a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The username.
    pub username: String,
    /// The password.
    pub password: String,
}

impl Credentials {
    /// Create credentials from parts.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization: Basic <base64(user:password)>` header value.
    ///
    /// The password may itself contain `:`; only the first one separates.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedCredentials` if the scheme is not `Basic`
    /// or the payload is not valid base64-encoded UTF-8 containing a `:`.
    pub fn from_basic_header(value: &str) -> Result<Self> {
        let (scheme, encoded) = value
            .trim()
            .split_once(' ')
            .ok_or_else(|| AuthError::MalformedCredentials("missing scheme".to_string()))?;

        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthError::MalformedCredentials(format!(
                "unsupported scheme: {scheme}"
            )));
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::MalformedCredentials(e.to_string()))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AuthError::MalformedCredentials("not utf-8".to_string()))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AuthError::MalformedCredentials("missing separator".to_string()))?;

        Ok(Self::new(username, password))
    }

    /// Encode as an `Authorization` header value.
    #[must_use]
    pub fn to_basic_header(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {encoded}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
