//! Bearer token orchestration.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use vmpool_core::TokenId;
use vmpool_store::{Store, StoreError, Token, VmState};

use crate::error::{ControlError, Result};
use crate::metrics::{counters, DummyMetrics, Metrics};
use crate::types::{TokenDetail, TokenSummary};

/// How many fresh ids `create_token` draws before giving up.
pub const MAX_TOKEN_ATTEMPTS: u32 = 8;

type IdSource = Box<dyn Fn() -> TokenId + Send + Sync>;

/// Issues, lists, inspects and revokes tokens.
pub struct TokenService<S: Store> {
    store: Arc<S>,
    next_id: IdSource,
    metrics: Arc<dyn Metrics>,
}

impl<S: Store> TokenService<S> {
    /// Create a token service drawing ids from the OS random source.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_id_source(store, TokenId::generate)
    }

    /// Create a token service with a custom id source.
    #[must_use]
    pub fn with_id_source<F>(store: Arc<S>, next_id: F) -> Self
    where
        F: Fn() -> TokenId + Send + Sync + 'static,
    {
        Self {
            store,
            next_id: Box::new(next_id),
            metrics: Arc::new(DummyMetrics),
        }
    }

    /// Count issued and revoked tokens into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Issue a new token owned by `user`.
    ///
    /// A freshly drawn id that is already taken is discarded and redrawn.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Internal` if no free id was found within
    /// [`MAX_TOKEN_ATTEMPTS`] draws.
    pub fn create_token(&self, user: &str) -> Result<Token> {
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = Token {
                id: (self.next_id)(),
                user: user.to_string(),
                created: Utc::now(),
            };

            if self.store.insert_token(&token)? {
                self.metrics.increment(counters::TOKEN_CREATED);
                tracing::info!(token = %token.id.redacted(), user = %user, "Created token");
                return Ok(token);
            }

            tracing::warn!(attempt, "Token id collision, regenerating");
        }

        Err(ControlError::Internal(format!(
            "no free token id after {MAX_TOKEN_ATTEMPTS} attempts"
        )))
    }

    /// All tokens keyed by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn list_tokens(&self) -> Result<BTreeMap<TokenId, TokenSummary>> {
        Ok(self
            .store
            .list_tokens()?
            .into_iter()
            .map(|token| {
                (
                    token.id,
                    TokenSummary {
                        user: token.user,
                        created: token.created,
                    },
                )
            })
            .collect())
    }

    /// A token with its VMs grouped by state.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::TokenNotFound` if the token doesn't exist.
    pub fn get_token_detail(&self, token_id: &TokenId) -> Result<TokenDetail> {
        let token = self
            .store
            .get_token(token_id)?
            .ok_or_else(|| ControlError::TokenNotFound(token_id.clone()))?;

        let mut vms: BTreeMap<VmState, Vec<String>> = BTreeMap::new();
        for vm in self.store.list_vms_by_token(token_id)? {
            vms.entry(vm.state).or_default().push(vm.hostname);
        }
        for hostnames in vms.values_mut() {
            hostnames.sort();
        }

        Ok(TokenDetail {
            user: token.user,
            created: token.created,
            vms,
        })
    }

    /// Revoke a token. VM records that reference it are left alone.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::TokenNotFound` if the token doesn't exist.
    pub fn delete_token(&self, token_id: &TokenId) -> Result<()> {
        match self.store.delete_token(token_id) {
            Ok(()) => {
                self.metrics.increment(counters::TOKEN_DELETED);
                tracing::info!(token = %token_id.redacted(), "Deleted token");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(ControlError::TokenNotFound(token_id.clone())),
            Err(e) => Err(e.into()),
        }
    }
}
