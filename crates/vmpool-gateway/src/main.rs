//! vmpool gateway: pool configuration and token API.
//!
//! Reads the process configuration from the TOML file named by
//! `VMPOOL_CONFIG` (default `vmpool.toml`). `LISTEN_ADDR` and `DATA_DIR`
//! override the listener address and the `RocksDB` directory.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vmpool_auth::build_authenticator;
use vmpool_control::ControlPlaneService;
use vmpool_gateway::{create_router, GatewayState, PoolerConfig, PrometheusMetrics};
use vmpool_store::{RocksStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vmpool=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting vmpool gateway");

    let config = PoolerConfig::from_env()?;

    tracing::info!(
        listen_addr = %config.gateway.listen_addr,
        data_dir = %config.data_dir.display(),
        pools = config.pools.len(),
        aliases = config.alias.len(),
        experimental_features = config.experimental_features,
        auth_enabled = config.auth.enabled,
        "Configuration loaded"
    );

    // Initialize RocksDB store and seed declared pools
    tracing::info!(path = %config.data_dir.display(), "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);
    store.declare_pools(&config.pools, &config.alias)?;

    let metrics = Arc::new(PrometheusMetrics::new()?);
    let control = Arc::new(
        ControlPlaneService::new(store, config.control_config()).with_metrics(metrics.clone()),
    );
    let authenticator = build_authenticator(&config.auth);

    let listen_addr = config.gateway.listen_addr.clone();
    let state = GatewayState::new(
        control,
        authenticator,
        config.auth.enabled,
        config.gateway,
    )
    .with_metrics(metrics);
    let app = create_router(state);

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
