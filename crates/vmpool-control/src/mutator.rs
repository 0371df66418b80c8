//! The pool reconfiguration protocol.
//!
//! A change-set is validated in full before anything is written. Every
//! offending entry is reported, and a change-set with any offending entry
//! writes nothing. Accepted change-sets are applied to the store in one
//! atomic batch.

use std::sync::Arc;

use vmpool_store::{Pool, PoolUpdate, Store};

use crate::changeset::ChangeSet;
use crate::error::{ChangeRejection, ControlError, Result};
use crate::metrics::{counters, DummyMetrics, Metrics};
use crate::types::{ChangeSummary, ControlConfig};
use crate::validate::ChangeKind;

/// Validates and applies pool template and size change-sets.
pub struct ConfigMutator<S: Store> {
    store: Arc<S>,
    config: ControlConfig,
    metrics: Arc<dyn Metrics>,
}

impl<S: Store> ConfigMutator<S> {
    /// Create a mutator over the given store.
    #[must_use]
    pub fn new(store: Arc<S>, config: ControlConfig) -> Self {
        Self {
            store,
            config,
            metrics: Arc::new(DummyMetrics),
        }
    }

    /// Count outcomes into `metrics` instead of dropping them.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Whether pool mutation is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.config.experimental_features
    }

    /// Current pool configuration in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn get_pool_configuration(&self) -> Result<Vec<Pool>> {
        Ok(self.store.list_pools()?)
    }

    /// Apply a batch of template changes.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::FeatureDisabled` if mutation is disabled and
    /// `ControlError::InvalidChanges` if any entry is rejected.
    pub fn apply_template_changes(&self, changes: &ChangeSet) -> Result<ChangeSummary> {
        self.apply(ChangeKind::Template, changes)
    }

    /// Apply a batch of size changes.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::FeatureDisabled` if mutation is disabled and
    /// `ControlError::InvalidChanges` if any entry is rejected.
    pub fn apply_size_changes(&self, changes: &ChangeSet) -> Result<ChangeSummary> {
        self.apply(ChangeKind::Size, changes)
    }

    fn apply(&self, kind: ChangeKind, changes: &ChangeSet) -> Result<ChangeSummary> {
        if !self.enabled() {
            return Err(ControlError::FeatureDisabled);
        }

        let updates = self.validate(kind, changes)?;
        let changed_pools = self.store.update_pools(&updates)?;

        if changed_pools.is_empty() {
            self.metrics.increment(counters::changes_unchanged(kind));
            tracing::debug!(
                kind = kind.as_str(),
                entries = updates.len(),
                "Pool changes were no-ops"
            );
        } else {
            self.metrics.increment(counters::changes_applied(kind));
            tracing::info!(kind = kind.as_str(), pools = ?changed_pools, "Applied pool changes");
        }

        Ok(ChangeSummary { changed_pools })
    }

    /// Resolve and parse every entry, collecting all rejections.
    fn validate(&self, kind: ChangeKind, changes: &ChangeSet) -> Result<Vec<PoolUpdate>> {
        let mut updates = Vec::with_capacity(changes.len());
        let mut rejections = Vec::new();

        for entry in changes.iter() {
            let Some(pool) = self.store.resolve_pool_name(&entry.name)? else {
                rejections.push(ChangeRejection::UnknownPoolName(entry.name.clone()));
                continue;
            };

            match kind.parse(&entry.name, entry.raw_value.as_deref()) {
                Ok(change) => updates.push(PoolUpdate { pool, change }),
                Err(rejection) => rejections.push(rejection),
            }
        }

        if rejections.is_empty() {
            Ok(updates)
        } else {
            let rejected: Vec<&str> = rejections.iter().map(ChangeRejection::name).collect();
            tracing::debug!(kind = kind.as_str(), ?rejected, "Rejected pool changes");
            self.metrics.increment(counters::changes_rejected(kind));
            Err(ControlError::InvalidChanges(rejections))
        }
    }
}
