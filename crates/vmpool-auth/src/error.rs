//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Authentication is not configured; gated endpoints are hidden.
    #[error("authentication disabled")]
    Disabled,

    /// No credentials were supplied.
    #[error("missing credentials")]
    MissingCredentials,

    /// The supplied credentials could not be decoded.
    #[error("malformed credentials: {0}")]
    MalformedCredentials(String),

    /// The credential check rejected the username/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,
}

impl AuthError {
    /// Returns the appropriate HTTP status code for this error.
    ///
    /// A disabled auth subsystem reports 404 so the endpoints look absent
    /// rather than locked.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Disabled => 404,
            Self::MissingCredentials | Self::MalformedCredentials(_) | Self::InvalidCredentials => {
                401
            }
        }
    }
}
