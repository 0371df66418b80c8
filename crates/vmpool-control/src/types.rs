//! Request and response types for control plane operations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vmpool_store::VmState;

/// Configuration for the control plane service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Enables the pool reconfiguration endpoints.
    #[serde(default)]
    pub experimental_features: bool,
}

/// Outcome of an accepted change-set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Canonical names of pools whose value actually changed.
    pub changed_pools: Vec<String>,
}

impl ChangeSummary {
    /// Whether any pool changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.changed_pools.is_empty()
    }
}

/// A token as shown in the token listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSummary {
    /// User the token was issued to.
    pub user: String,
    /// Creation time.
    pub created: DateTime<Utc>,
}

/// A single token with the VMs currently checked out against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDetail {
    /// User the token was issued to.
    pub user: String,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Hostnames grouped by VM state, each list sorted.
    pub vms: BTreeMap<VmState, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn control_config_defaults_to_disabled() {
        assert!(!ControlConfig::default().experimental_features);

        let config: ControlConfig = serde_json::from_str("{}").unwrap();
        assert!(!config.experimental_features);
    }

    #[test]
    fn change_summary_changed() {
        assert!(!ChangeSummary::default().changed());
        let summary = ChangeSummary {
            changed_pools: vec!["pool1".to_string()],
        };
        assert!(summary.changed());
    }

    #[test]
    fn token_detail_json_shape() {
        let detail = TokenDetail {
            user: "admin".to_string(),
            created: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            vms: BTreeMap::from([(VmState::Running, vec!["vm1".to_string()])]),
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["user"], "admin");
        assert_eq!(json["created"], "2024-05-01T12:00:00Z");
        assert_eq!(json["vms"]["running"][0], "vm1");
    }
}
