//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use vmpool_auth::Authenticator;
use vmpool_control::ControlPlane;

use crate::config::GatewayConfig;
use crate::metrics::PrometheusMetrics;

/// Shared application state for the gateway.
///
/// This struct holds references to all services needed by the HTTP handlers.
pub struct GatewayState<C, A>
where
    C: ControlPlane,
    A: Authenticator + ?Sized,
{
    /// The control plane for pool and token operations.
    pub control: Arc<C>,
    /// Credential check for administrative endpoints.
    pub authenticator: Arc<A>,
    /// Whether the token endpoints are served at all.
    pub auth_enabled: bool,
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// Metrics served from `GET /metrics`, if installed.
    pub metrics: Option<Arc<PrometheusMetrics>>,
}

impl<C, A> GatewayState<C, A>
where
    C: ControlPlane,
    A: Authenticator + ?Sized,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(
        control: Arc<C>,
        authenticator: Arc<A>,
        auth_enabled: bool,
        config: GatewayConfig,
    ) -> Self {
        Self {
            control,
            authenticator,
            auth_enabled,
            config,
            metrics: None,
        }
    }

    /// Serve `metrics` from `GET /metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<PrometheusMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl<C, A> Clone for GatewayState<C, A>
where
    C: ControlPlane,
    A: Authenticator + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
            authenticator: Arc::clone(&self.authenticator),
            auth_enabled: self.auth_enabled,
            config: self.config.clone(),
            metrics: self.metrics.clone(),
        }
    }
}
