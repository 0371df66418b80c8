//! Pool configuration endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use vmpool_auth::Authenticator;
use vmpool_control::{ChangeSet, ChangeSummary, ControlPlane, Pool};

use crate::error::ApiError;
use crate::response::{OkBody, PrettyJson};
use crate::state::GatewayState;

/// Response for `GET /config`.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    /// Declared pools in order, with any runtime changes applied.
    pub pool_configuration: Vec<Pool>,
}

/// Current pool configuration.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub async fn get_config<C, A>(
    State(state): State<Arc<GatewayState<C, A>>>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    let pool_configuration = state.control.get_pool_configuration().await?;
    Ok(PrettyJson(ConfigResponse { pool_configuration }))
}

/// Replace pool templates.
///
/// ```text
/// POST /api/v1/config/pooltemplate
/// {"pool1": "templates/new_template"}
///
/// Response: 201 Created
/// {
///   "ok": true
/// }
/// ```
///
/// # Errors
///
/// Returns 405 while experimental features are off, 400 for a malformed body
/// or any rejected entry.
pub async fn update_pool_templates<C, A>(
    State(state): State<Arc<GatewayState<C, A>>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    let changes = parse_changes(state.control.as_ref(), &body)?;
    let summary = state.control.apply_template_changes(changes).await?;
    Ok(applied(&summary))
}

/// Resize pools.
///
/// # Errors
///
/// Returns 405 while experimental features are off, 400 for a malformed body
/// or any rejected entry.
pub async fn update_pool_sizes<C, A>(
    State(state): State<Arc<GatewayState<C, A>>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    let changes = parse_changes(state.control.as_ref(), &body)?;
    let summary = state.control.apply_size_changes(changes).await?;
    Ok(applied(&summary))
}

/// The feature gate is checked before the body is looked at.
fn parse_changes<C: ControlPlane>(control: &C, body: &[u8]) -> Result<ChangeSet, ApiError> {
    if !control.mutations_enabled() {
        return Err(ApiError::FeatureDisabled);
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn applied(summary: &ChangeSummary) -> impl IntoResponse {
    let status = if summary.changed() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, PrettyJson(OkBody::SUCCESS))
}
