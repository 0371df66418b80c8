//! Domain types stored in the database.
//!
//! These types represent the persisted state of pools, tokens, and VM records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vmpool_core::TokenId;

/// A declared pool of virtual machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Canonical pool name.
    pub name: String,
    /// Desired number of ready VMs.
    pub size: u32,
    /// Backend-specific template path. Pools may be declared without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Pool {
    /// Apply a change in place, returning `true` if the pool was modified.
    pub fn apply(&mut self, change: &PoolChange) -> bool {
        match change {
            PoolChange::Template(template) => {
                if self.template.as_deref() == Some(template.as_str()) {
                    return false;
                }
                self.template = Some(template.clone());
                true
            }
            PoolChange::Size(size) => {
                if self.size == *size {
                    return false;
                }
                self.size = *size;
                true
            }
        }
    }
}

/// A validated change to one pool attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolChange {
    /// Replace the pool template.
    Template(String),
    /// Replace the pool size.
    Size(u32),
}

/// A change addressed to a canonical pool name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolUpdate {
    /// Canonical pool name.
    pub pool: String,
    /// The change to apply.
    pub change: PoolChange,
}

/// A bearer token record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token identifier, also the bearer secret.
    pub id: TokenId,
    /// User the token was issued to.
    pub user: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

/// Lifecycle states of a pooled VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    /// Being cloned from the pool template.
    Pending,
    /// Booted and waiting to be checked out.
    Ready,
    /// Checked out by a client.
    Running,
    /// Returned or expired, awaiting destruction.
    Completed,
}

/// A VM record owned by the pooling engine.
///
/// The control plane only reads these. `token_id` is a plain reference; the
/// token may already be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmRecord {
    /// VM hostname.
    pub hostname: String,
    /// Pool the VM was cloned for.
    pub pool: String,
    /// Token the VM was checked out with, if any.
    #[serde(default)]
    pub token_id: Option<TokenId>,
    /// Current lifecycle state.
    pub state: VmState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_without_template_omits_key() {
        let pool = Pool {
            name: "pool2".to_string(),
            size: 10,
            template: None,
        };
        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json, serde_json::json!({"name": "pool2", "size": 10}));
    }

    #[test]
    fn apply_reports_change() {
        let mut pool = Pool {
            name: "pool1".to_string(),
            size: 5,
            template: Some("templates/pool1".to_string()),
        };

        assert!(!pool.apply(&PoolChange::Size(5)));
        assert!(pool.apply(&PoolChange::Size(2)));
        assert_eq!(pool.size, 2);

        assert!(!pool.apply(&PoolChange::Template("templates/pool1".to_string())));
        assert!(pool.apply(&PoolChange::Template("templates/new".to_string())));
        assert_eq!(pool.template.as_deref(), Some("templates/new"));
    }

    #[test]
    fn template_on_untemplated_pool_is_a_change() {
        let mut pool = Pool {
            name: "pool2".to_string(),
            size: 10,
            template: None,
        };
        assert!(pool.apply(&PoolChange::Template("templates/pool2".to_string())));
    }

    #[test]
    fn vm_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&VmState::Running).unwrap(),
            "\"running\""
        );
    }
}
