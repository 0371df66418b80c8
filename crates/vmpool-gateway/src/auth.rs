//! Authorization checks for the token endpoints.
//!
//! Two separate checks exist. Administrative endpoints take the
//! [`AdminCredentials`] extractor, which requires a valid HTTP Basic pair.
//! Single-token reads call [`require_bearer_token`], where knowing the token
//! id is itself the credential.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use vmpool_auth::{AuthError, Authenticator, Credentials};
use vmpool_control::{ControlPlane, TokenId};

use crate::error::ApiError;
use crate::state::GatewayState;

/// An administrator authenticated with HTTP Basic credentials.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    /// The authenticated username.
    pub username: String,
}

/// Check administrative credentials.
///
/// # Errors
///
/// Returns `AuthError::Disabled` when authentication is turned off, whatever
/// the request carries. Otherwise returns a credential error if the
/// `Authorization` header is missing, malformed or rejected.
pub async fn require_admin<A>(
    auth_enabled: bool,
    authenticator: &A,
    headers: &HeaderMap,
) -> Result<AdminCredentials, AuthError>
where
    A: Authenticator + ?Sized,
{
    if !auth_enabled {
        return Err(AuthError::Disabled);
    }

    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredentials("non-ascii header".to_string()))?;

    let credentials = Credentials::from_basic_header(header)?;

    if authenticator
        .authenticate(&credentials.username, &credentials.password)
        .await
    {
        Ok(AdminCredentials {
            username: credentials.username,
        })
    } else {
        tracing::debug!(user = %credentials.username, "Rejected administrative credentials");
        Err(AuthError::InvalidCredentials)
    }
}

/// Accept a token id from the path as a bearer credential.
///
/// Whether the token exists is left to the lookup that follows.
///
/// # Errors
///
/// Returns `ApiError::AuthDisabled` when authentication is turned off and
/// `ApiError::NotFound` if the id is empty.
pub fn require_bearer_token(auth_enabled: bool, raw: &str) -> Result<TokenId, ApiError> {
    if !auth_enabled {
        return Err(ApiError::AuthDisabled);
    }
    TokenId::new(raw).map_err(|_| ApiError::NotFound)
}

#[async_trait]
impl<C, A> FromRequestParts<Arc<GatewayState<C, A>>> for AdminCredentials
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState<C, A>>,
    ) -> Result<Self, Self::Rejection> {
        Ok(require_admin(state.auth_enabled, state.authenticator.as_ref(), &parts.headers).await?)
    }
}
