//! Prometheus metrics for the control plane.
//!
//! Control plane events are counted into one labelled counter and scraped
//! from `GET /metrics` in the Prometheus text format.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use vmpool_control::Metrics;

/// Counter of control plane events, labelled by event name.
const EVENTS_TOTAL: &str = "vmpool_events_total";

/// A [`Metrics`] sink backed by a private Prometheus registry.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    events: IntCounterVec,
}

impl PrometheusMetrics {
    /// Create and register the event counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let events = IntCounterVec::new(
            Opts::new(EVENTS_TOTAL, "Control plane events by name"),
            &["event"],
        )?;
        registry.register(Box::new(events.clone()))?;
        Ok(Self { registry, events })
    }

    /// Current value of the counter for `event`.
    #[must_use]
    pub fn count(&self, event: &str) -> u64 {
        self.events.with_label_values(&[event]).get()
    }

    /// Encode every registered metric in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Metrics for PrometheusMetrics {
    fn increment(&self, name: &str) {
        self.events.with_label_values(&[name]).inc();
    }
}
