//! API error types and responses.
//!
//! Every error renders as `{"ok": false, ...}`. Internal details are logged
//! and never returned to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use vmpool_auth::AuthError;
use vmpool_control::ControlError;

use crate::response::{OkBody, PrettyJson};

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Pool reconfiguration is disabled.
    #[error("experimental features are disabled")]
    FeatureDisabled,

    /// Some change-set entries were rejected; carries the submitted names.
    #[error("invalid changes: {0:?}")]
    InvalidChanges(Vec<String>),

    /// Invalid request body or parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The authentication subsystem is disabled.
    #[error("authentication disabled")]
    AuthDisabled,

    /// Missing or invalid administrative credentials.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The requested resource was not found.
    #[error("not found")]
    NotFound,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Body of a rejected change-set.
#[derive(Debug, Serialize)]
struct InvalidChangesBody<'a> {
    ok: bool,
    bad_templates: &'a [String],
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::FeatureDisabled => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidChanges(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AuthDisabled | Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::InvalidChanges(names) => (
                status,
                PrettyJson(InvalidChangesBody {
                    ok: false,
                    bad_templates: names,
                }),
            )
                .into_response(),
            Self::BadRequest(reason) => {
                tracing::debug!(reason = %reason, "Bad request");
                (status, PrettyJson(OkBody::FAILURE)).into_response()
            }
            Self::Internal(message) => {
                tracing::error!(error = %message, "Request failed");
                (status, PrettyJson(OkBody::FAILURE)).into_response()
            }
            _ => (status, PrettyJson(OkBody::FAILURE)).into_response(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Disabled => Self::AuthDisabled,
            AuthError::MissingCredentials
            | AuthError::MalformedCredentials(_)
            | AuthError::InvalidCredentials => Self::Unauthenticated,
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::FeatureDisabled => Self::FeatureDisabled,
            ControlError::InvalidChanges(rejections) => Self::InvalidChanges(
                rejections
                    .into_iter()
                    .map(|rejection| rejection.name().to_string())
                    .collect(),
            ),
            ControlError::TokenNotFound(_) => Self::NotFound,
            ControlError::Store(store_err) => {
                tracing::error!(error = %store_err, "Store error");
                Self::Internal("storage error".to_string())
            }
            ControlError::Internal(msg) => Self::Internal(msg),
        }
    }
}
