//! Metrics sink for control plane events.
//!
//! The control plane counts what it does through [`Metrics`]. The gateway
//! installs a Prometheus-backed sink; everything else gets [`DummyMetrics`].

use crate::validate::ChangeKind;

/// A sink for named counters.
pub trait Metrics: Send + Sync {
    /// Add one to the counter `name`.
    fn increment(&self, name: &str);
}

/// A sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyMetrics;

impl Metrics for DummyMetrics {
    fn increment(&self, _name: &str) {}
}

/// Counter names emitted by the control plane.
pub mod counters {
    use super::ChangeKind;

    /// A token was issued.
    pub const TOKEN_CREATED: &str = "token.created";
    /// A token was revoked.
    pub const TOKEN_DELETED: &str = "token.deleted";

    /// A change-set modified at least one pool.
    #[must_use]
    pub const fn changes_applied(kind: ChangeKind) -> &'static str {
        match kind {
            ChangeKind::Template => "config.template.applied",
            ChangeKind::Size => "config.size.applied",
        }
    }

    /// A change-set was accepted but modified nothing.
    #[must_use]
    pub const fn changes_unchanged(kind: ChangeKind) -> &'static str {
        match kind {
            ChangeKind::Template => "config.template.unchanged",
            ChangeKind::Size => "config.size.unchanged",
        }
    }

    /// A change-set had at least one rejected entry.
    #[must_use]
    pub const fn changes_rejected(kind: ChangeKind) -> &'static str {
        match kind {
            ChangeKind::Template => "config.template.rejected",
            ChangeKind::Size => "config.size.rejected",
        }
    }
}
