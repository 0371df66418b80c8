//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::middleware::map_response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use vmpool_auth::Authenticator;
use vmpool_control::ControlPlane;

use crate::handlers::{config, metrics, tokens};
use crate::response::json_error_bodies;
use crate::state::GatewayState;

/// Prefix for every versioned route.
pub const API_PREFIX: &str = "/api/v1";

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /metrics` - Prometheus scrape (404 unless a sink is installed)
///
/// ## Pool configuration
/// - `GET /api/v1/config` - Current pools
/// - `POST /api/v1/config/pooltemplate` - Change templates (feature-gated)
/// - `POST /api/v1/config/poolsize` - Change sizes (feature-gated)
///
/// ## Tokens
/// - `GET /api/v1/token` - List tokens (admin)
/// - `POST /api/v1/token` - Create token (admin)
/// - `GET /api/v1/token/:token` - Token detail (bearer)
/// - `DELETE /api/v1/token/:token` - Delete token (admin)
///
/// Error responses raised by the middleware or by unmatched routes are
/// given a `{"ok": false}` body like every other error.
pub fn create_router<C, A>(state: GatewayState<C, A>) -> Router
where
    C: ControlPlane + 'static,
    A: Authenticator + ?Sized + 'static,
{
    // Extract config values before moving state
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    let api: Router<Arc<GatewayState<C, A>>> = Router::new()
        // Pool configuration
        .route("/config", get(config::get_config::<C, A>))
        .route(
            "/config/pooltemplate",
            post(config::update_pool_templates::<C, A>),
        )
        .route("/config/poolsize", post(config::update_pool_sizes::<C, A>))
        // Tokens
        .route(
            "/token",
            get(tokens::list_tokens::<C, A>).post(tokens::create_token::<C, A>),
        )
        .route(
            "/token/:token",
            get(tokens::get_token::<C, A>).delete(tokens::delete_token::<C, A>),
        );

    Router::new()
        // Metrics (public)
        .route("/metrics", get(metrics::metrics::<C, A>))
        .nest(API_PREFIX, api)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(map_response(json_error_bodies))
        .with_state(state)
}
