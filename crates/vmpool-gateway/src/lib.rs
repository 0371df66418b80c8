//! HTTP gateway for vmpool pool configuration and tokens.
//!
//! This crate provides the public-facing API of the pooling service's
//! control plane. It handles:
//!
//! - Pool configuration reads and feature-gated reconfiguration
//! - Token issue, listing, inspection and revocation
//! - The administrative (HTTP Basic) and bearer (token id) authorization checks
//! - Indented JSON responses with stable status codes
//! - Prometheus counters for control plane events
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Clients                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       vmpool-gateway                        │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │  AuthGate   │ │   Router    │ │   Pretty JSON       │    │
//! │  │  checks     │ │ + Handlers  │ │   responses         │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     ┌────────┴────────┐
//!                     ▼                 ▼
//!              ┌──────────────┐  ┌──────────────┐
//!              │ Control      │  │ Auth         │
//!              │ Plane        │  │ (Basic)      │
//!              └──────────────┘  └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vmpool_auth::{build_authenticator, AuthConfig};
//! use vmpool_control::{ControlConfig, ControlPlaneService};
//! use vmpool_gateway::{create_router, GatewayConfig, GatewayState};
//! use vmpool_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/vmpool")?);
//! let control = Arc::new(ControlPlaneService::new(store, ControlConfig::default()));
//! let auth = AuthConfig::default();
//!
//! let state = GatewayState::new(
//!     control,
//!     build_authenticator(&auth),
//!     auth.enabled,
//!     GatewayConfig::default(),
//! );
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:4567").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod response;
pub mod routes;
pub mod state;

pub use config::{ConfigError, GatewayConfig, PoolerConfig};
pub use error::ApiError;
pub use metrics::PrometheusMetrics;
pub use routes::{create_router, API_PREFIX};
pub use state::GatewayState;

// Re-export key types for convenience
pub use auth::AdminCredentials;
