//! Token endpoints.
//!
//! Listing, creating and deleting tokens need administrative credentials.
//! Reading a single token needs only the token id.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use vmpool_auth::Authenticator;
use vmpool_control::{ControlError, ControlPlane, TokenId};

use crate::auth::{require_bearer_token, AdminCredentials};
use crate::error::ApiError;
use crate::response::{OkBody, OkWith, PrettyJson};
use crate::state::GatewayState;

/// Response for `POST /token`.
#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    /// Always `true`.
    pub ok: bool,
    /// The new token id.
    pub token: String,
}

/// List every token.
///
/// ```text
/// GET /api/v1/token
///
/// Response: 200 OK
/// {
///   "ok": true,
///   "<token id>": {
///     "user": "admin",
///     "created": "2024-05-01T12:00:00Z"
///   }
/// }
/// ```
///
/// # Errors
///
/// Returns 404 when authentication is disabled and 401 without valid
/// administrative credentials.
pub async fn list_tokens<C, A>(
    State(state): State<Arc<GatewayState<C, A>>>,
    _admin: AdminCredentials,
) -> Result<Response, ApiError>
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    let tokens = state.control.list_tokens().await?;
    Ok(PrettyJson(OkWith(&tokens)).into_response())
}

/// Issue a token owned by the authenticated administrator.
///
/// # Errors
///
/// Returns 404 when authentication is disabled and 401 without valid
/// administrative credentials.
pub async fn create_token<C, A>(
    State(state): State<Arc<GatewayState<C, A>>>,
    admin: AdminCredentials,
) -> Result<impl IntoResponse, ApiError>
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    let token = state.control.create_token(&admin.username).await?;

    Ok(PrettyJson(CreateTokenResponse {
        ok: true,
        token: token.id.into(),
    }))
}

/// Read one token and the VMs checked out with it.
///
/// ```text
/// GET /api/v1/token/<token id>
///
/// Response: 200 OK
/// {
///   "ok": true,
///   "<token id>": {
///     "user": "admin",
///     "created": "2024-05-01T12:00:00Z",
///     "vms": {
///       "running": ["vm1"]
///     }
///   }
/// }
/// ```
///
/// # Errors
///
/// Returns 404 when authentication is disabled or the token is unknown.
pub async fn get_token<C, A>(
    State(state): State<Arc<GatewayState<C, A>>>,
    Path(token): Path<String>,
) -> Result<Response, ApiError>
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    let token_id = require_bearer_token(state.auth_enabled, &token)?;
    let detail = state.control.get_token_detail(&token_id).await?;

    Ok(PrettyJson(OkWith([(token_id.as_str(), &detail)])).into_response())
}

/// Revoke a token.
///
/// # Errors
///
/// Returns 404 when authentication is disabled, and 401 without valid
/// administrative credentials or when the token does not exist.
pub async fn delete_token<C, A>(
    State(state): State<Arc<GatewayState<C, A>>>,
    admin: AdminCredentials,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    // The extractor has already checked administrative credentials
    let token_id = TokenId::new(token).map_err(|_| ApiError::Unauthenticated)?;

    match state.control.delete_token(&token_id).await {
        Ok(()) => {
            tracing::debug!(user = %admin.username, "Token revoked by administrator");
            Ok(PrettyJson(OkBody::SUCCESS))
        }
        // Existing clients expect 401 here rather than 404
        Err(ControlError::TokenNotFound(_)) => Err(ApiError::Unauthenticated),
        Err(e) => Err(e.into()),
    }
}
