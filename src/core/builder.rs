//! Builder assembling a [`Supervisor`] and its runtime plumbing.

use std::sync::Arc;

use crate::care::{NoopReporter, Reporter};
use crate::cell::CellApi;
use crate::core::registry::Registry;
use crate::core::{Config, Supervisor};
use crate::events::Bus;
use crate::subscribers::{StreamHealth, Subscribe, SubscriberSet};

/// Builder for constructing a [`Supervisor`].
///
/// A [`StreamHealth`] tracker is always wired in as a subscriber; user
/// subscribers are added on top. Without an explicit reporter the
/// fleet-care side is a no-op.
pub struct SupervisorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            reporter: None,
        }
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Replaces the subscriber list.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the fleet-care reporter streaming tasks publish through.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Builds the supervisor over the given cell.
    ///
    /// Spawns the subscriber workers, so this must be called inside a
    /// tokio runtime.
    pub fn build(self, cell: Arc<dyn CellApi>) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let health = Arc::new(StreamHealth::new());

        let mut subscribers = self.subscribers;
        subscribers.push(Arc::clone(&health) as Arc<dyn Subscribe>);
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));

        let registry = Registry::new(bus.clone());
        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(NoopReporter) as Arc<dyn Reporter>);

        Arc::new(Supervisor::new_internal(
            self.cfg, bus, subs, health, registry, cell, reporter,
        ))
    }
}
