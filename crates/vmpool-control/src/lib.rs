//! Control plane for vmpool pool configuration and tokens.
//!
//! This crate holds the business logic behind the HTTP surface: the
//! all-or-nothing pool reconfiguration protocol and bearer token management.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Gateway (HTTP)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ControlPlaneService                      │
//! │      ┌─────────────────────┐   ┌─────────────────────┐      │
//! │      │    ConfigMutator    │   │    TokenService     │      │
//! │      └─────────────────────┘   └─────────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                         │
//!                    ▼                         ▼
//!             ┌─────────────┐          ┌──────────────┐
//!             │    Store    │          │   Metrics    │
//!             │  (RocksDB)  │          │    sink      │
//!             └─────────────┘          └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use vmpool_control::{ChangeSet, ControlConfig, ControlPlane, ControlPlaneService};
//! use vmpool_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/vmpool")?);
//! let control = ControlPlaneService::new(
//!     store,
//!     ControlConfig { experimental_features: true },
//! );
//!
//! let changes = ChangeSet::from_pairs([("debian-12", "templates/debian-12.1")]);
//! let summary = control.apply_template_changes(changes).await?;
//! println!("changed: {:?}", summary.changed_pools);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod changeset;
pub mod error;
pub mod metrics;
pub mod mutator;
pub mod service;
pub mod tokens;
pub mod types;
pub mod validate;

pub use changeset::{ChangeEntry, ChangeSet};
pub use error::{ChangeRejection, ControlError, Result};
pub use metrics::{DummyMetrics, Metrics};
pub use mutator::ConfigMutator;
pub use service::{ControlPlane, ControlPlaneService};
pub use tokens::{TokenService, MAX_TOKEN_ATTEMPTS};
pub use types::{ChangeSummary, ControlConfig, TokenDetail, TokenSummary};

// Re-export commonly used types from dependencies for convenience
pub use vmpool_core::TokenId;
pub use vmpool_store::{Pool, Token, VmState};
