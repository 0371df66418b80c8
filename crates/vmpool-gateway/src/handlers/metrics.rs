//! Metrics scrape endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};

use vmpool_auth::Authenticator;
use vmpool_control::ControlPlane;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Content type of the Prometheus text format.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// Control plane counters in the Prometheus text format.
///
/// # Errors
///
/// Returns 404 when no metrics sink is installed.
pub async fn metrics<C, A>(
    State(state): State<Arc<GatewayState<C, A>>>,
) -> Result<Response, ApiError>
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    let metrics = state.metrics.as_ref().ok_or(ApiError::NotFound)?;
    let body = metrics
        .encode()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(([(CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT))], body).into_response())
}
