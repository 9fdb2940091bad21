use std::sync::Arc;

use super::{bus::EventBus, config::BusConfig};
use crate::policies::{FailurePolicy, TeardownPolicy};
use crate::registry::Registries;

/// Builder for constructing an [`EventBus`] with a custom configuration or
/// registry provider.
#[derive(Debug, Default)]
pub struct EventBusBuilder {
    cfg: BusConfig,
    registries: Option<Arc<Registries>>,
}

impl EventBusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            registries: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: BusConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the handler panic policy.
    pub fn with_failure_policy(mut self, failure: FailurePolicy) -> Self {
        self.cfg.failure = failure;
        self
    }

    /// Sets the drop-time cleanup policy.
    pub fn with_teardown_policy(mut self, teardown: TeardownPolicy) -> Self {
        self.cfg.teardown = teardown;
        self
    }

    /// Sets the log label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.cfg.label = Some(label.into());
        self
    }

    /// Binds the bus to a specific registry provider.
    ///
    /// Without this, the bus uses [`Registries::global`].
    pub fn with_registries(mut self, registries: Arc<Registries>) -> Self {
        self.registries = Some(registries);
        self
    }

    /// Builds the bus with a fresh identity.
    pub fn build(self) -> EventBus {
        let registries = self.registries.unwrap_or_else(Registries::global);
        EventBus::from_parts(self.cfg, registries)
    }
}
