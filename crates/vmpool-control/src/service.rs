//! Control plane service implementation.
//!
//! This module provides the `ControlPlane` trait and `ControlPlaneService`
//! implementation that composes pool reconfiguration and token management.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use vmpool_core::TokenId;
use vmpool_store::{Pool, Store, Token};

use crate::changeset::ChangeSet;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::mutator::ConfigMutator;
use crate::tokens::TokenService;
use crate::types::{ChangeSummary, ControlConfig, TokenDetail, TokenSummary};

/// Trait defining the control plane operations.
///
/// The gateway holds this behind an `Arc` and never touches the store
/// directly.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Whether the pool reconfiguration operations are enabled.
    fn mutations_enabled(&self) -> bool;

    // =========================================================================
    // Pool Configuration
    // =========================================================================

    /// Current pool configuration in declaration order.
    async fn get_pool_configuration(&self) -> Result<Vec<Pool>>;

    /// Validate and apply a batch of template changes.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::FeatureDisabled` if mutation is disabled.
    /// Returns `ControlError::InvalidChanges` listing every rejected entry.
    async fn apply_template_changes(&self, changes: ChangeSet) -> Result<ChangeSummary>;

    /// Validate and apply a batch of size changes.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::FeatureDisabled` if mutation is disabled.
    /// Returns `ControlError::InvalidChanges` listing every rejected entry.
    async fn apply_size_changes(&self, changes: ChangeSet) -> Result<ChangeSummary>;

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Issue a new token owned by `user`.
    async fn create_token(&self, user: &str) -> Result<Token>;

    /// All tokens keyed by id.
    async fn list_tokens(&self) -> Result<BTreeMap<TokenId, TokenSummary>>;

    /// A token with the VMs checked out against it.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::TokenNotFound` if the token doesn't exist.
    async fn get_token_detail(&self, token_id: &TokenId) -> Result<TokenDetail>;

    /// Revoke a token.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::TokenNotFound` if the token doesn't exist.
    async fn delete_token(&self, token_id: &TokenId) -> Result<()>;
}

/// The main control plane service implementation.
pub struct ControlPlaneService<S: Store> {
    mutator: ConfigMutator<S>,
    tokens: TokenService<S>,
}

impl<S: Store> ControlPlaneService<S> {
    /// Create a new control plane service.
    #[must_use]
    pub fn new(store: Arc<S>, config: ControlConfig) -> Self {
        Self {
            mutator: ConfigMutator::new(Arc::clone(&store), config),
            tokens: TokenService::new(store),
        }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, ControlConfig::default())
    }

    /// Count control plane events into `metrics`.
    #[must_use]
    pub fn with_metrics(self, metrics: Arc<dyn Metrics>) -> Self {
        Self {
            mutator: self.mutator.with_metrics(Arc::clone(&metrics)),
            tokens: self.tokens.with_metrics(metrics),
        }
    }

    /// Create from explicit parts, e.g. a token service with a fixed id source.
    #[must_use]
    pub fn from_parts(mutator: ConfigMutator<S>, tokens: TokenService<S>) -> Self {
        Self { mutator, tokens }
    }
}

#[async_trait]
impl<S: Store + 'static> ControlPlane for ControlPlaneService<S> {
    fn mutations_enabled(&self) -> bool {
        self.mutator.enabled()
    }

    async fn get_pool_configuration(&self) -> Result<Vec<Pool>> {
        self.mutator.get_pool_configuration()
    }

    async fn apply_template_changes(&self, changes: ChangeSet) -> Result<ChangeSummary> {
        self.mutator.apply_template_changes(&changes)
    }

    async fn apply_size_changes(&self, changes: ChangeSet) -> Result<ChangeSummary> {
        self.mutator.apply_size_changes(&changes)
    }

    async fn create_token(&self, user: &str) -> Result<Token> {
        self.tokens.create_token(user)
    }

    async fn list_tokens(&self) -> Result<BTreeMap<TokenId, TokenSummary>> {
        self.tokens.list_tokens()
    }

    async fn get_token_detail(&self, token_id: &TokenId) -> Result<TokenDetail> {
        self.tokens.get_token_detail(token_id)
    }

    async fn delete_token(&self, token_id: &TokenId) -> Result<()> {
        self.tokens.delete_token(token_id)
    }
}
