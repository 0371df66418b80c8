//! Gateway and process configuration.
//!
//! The process reads one TOML file (path from `VMPOOL_CONFIG`) describing the
//! declared pools, their aliases, authentication and the HTTP listener.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use vmpool_auth::AuthConfig;
use vmpool_control::validate::valid_template;
use vmpool_control::ControlConfig;
use vmpool_store::Pool;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "VMPOOL_CONFIG";

/// Configuration file used when `VMPOOL_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "vmpool.toml";

/// Configuration for the HTTP listener.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:4567").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:4567".to_string()
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// Errors raised while loading the process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two pools share a name.
    #[error("pool {0} is declared more than once")]
    DuplicatePool(String),

    /// A declared template fails the template format check.
    #[error("pool {pool} has an invalid template: {template}")]
    InvalidTemplate {
        /// Pool name.
        pool: String,
        /// Offending template.
        template: String,
    },

    /// An alias reuses a pool name.
    #[error("alias {0} shadows a pool of the same name")]
    AliasShadowsPool(String),

    /// An alias points at a pool that is not declared.
    #[error("alias {alias} targets unknown pool {target}")]
    UnknownAliasTarget {
        /// Alias name.
        alias: String,
        /// Missing target.
        target: String,
    },
}

/// The full process configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolerConfig {
    /// Enables the pool reconfiguration endpoints.
    #[serde(default)]
    pub experimental_features: bool,

    /// `RocksDB` directory.
    #[serde(default = "PoolerConfig::default_data_dir")]
    pub data_dir: PathBuf,

    /// Administrative authentication.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Declared pools, in order.
    #[serde(default)]
    pub pools: Vec<Pool>,

    /// `alias -> pool` mapping.
    #[serde(default)]
    pub alias: BTreeMap<String, String>,

    /// HTTP listener settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl PoolerConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from("/var/lib/vmpool")
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the document is malformed or the pool
    /// declarations are inconsistent.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&input)
    }

    /// Load from `VMPOOL_CONFIG` and apply `LISTEN_ADDR` / `DATA_DIR` overrides.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(path)?;

        if let Ok(listen_addr) = std::env::var("LISTEN_ADDR") {
            config.gateway.listen_addr = listen_addr;
        }
        if let Ok(data_dir) = std::env::var("DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        Ok(config)
    }

    /// Check pool names, templates and aliases.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        for pool in &self.pools {
            if !names.insert(pool.name.as_str()) {
                return Err(ConfigError::DuplicatePool(pool.name.clone()));
            }
            if let Some(template) = &pool.template {
                if !valid_template(template) {
                    return Err(ConfigError::InvalidTemplate {
                        pool: pool.name.clone(),
                        template: template.clone(),
                    });
                }
            }
        }

        for (alias, target) in &self.alias {
            if names.contains(alias.as_str()) {
                return Err(ConfigError::AliasShadowsPool(alias.clone()));
            }
            if !names.contains(target.as_str()) {
                return Err(ConfigError::UnknownAliasTarget {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }

        Ok(())
    }

    /// Settings for the control plane.
    #[must_use]
    pub const fn control_config(&self) -> ControlConfig {
        ControlConfig {
            experimental_features: self.experimental_features,
        }
    }
}
