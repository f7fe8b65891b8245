//! Reporting seam between streaming tasks and the fleet-care transport.
//!
//! The broker connection is an external collaborator; streaming tasks only
//! see the [`Reporter`] trait. Built-ins:
//!
//! - [`NoopReporter`] - discards everything (default wiring)
//! - [`LogReporter`] - renders each would-be publication through `tracing`
//!   (`logging` feature)

use async_trait::async_trait;

use crate::care::schema::{DeviceErrors, DeviceFactsheet};
use crate::error::ReportError;

/// Publishes device lifecycle and error payloads to the fleet-care
/// surface.
///
/// Implementations own the transport (broker session, credentials,
/// reconnects). Methods are called from per-controller streaming tasks,
/// concurrently across controllers; a slow transport stalls only the
/// calling controller's task.
#[async_trait]
pub trait Reporter: Send + Sync + 'static {
    /// Publishes the retained factsheet for one device.
    async fn register_device(&self, factsheet: &DeviceFactsheet) -> Result<(), ReportError>;

    /// Marks one device online on its `connection` channel.
    async fn connect_device(&self, serial: &str) -> Result<(), ReportError>;

    /// Marks one device offline on its `connection` channel.
    ///
    /// Called on cancellation; failures are logged by the caller, never
    /// fatal.
    async fn disconnect_device(&self, serial: &str) -> Result<(), ReportError>;

    /// Publishes the current active-error set for one device.
    async fn publish_errors(&self, serial: &str, errors: &DeviceErrors)
        -> Result<(), ReportError>;
}

/// Reporter that discards every publication.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReporter;

#[async_trait]
impl Reporter for NoopReporter {
    async fn register_device(&self, _factsheet: &DeviceFactsheet) -> Result<(), ReportError> {
        Ok(())
    }

    async fn connect_device(&self, _serial: &str) -> Result<(), ReportError> {
        Ok(())
    }

    async fn disconnect_device(&self, _serial: &str) -> Result<(), ReportError> {
        Ok(())
    }

    async fn publish_errors(
        &self,
        _serial: &str,
        _errors: &DeviceErrors,
    ) -> Result<(), ReportError> {
        Ok(())
    }
}

#[cfg(feature = "logging")]
mod log_reporter {
    use super::*;
    use crate::care::schema::{Connection, ConnectionStatus};
    use crate::care::topic::TopicSpec;

    /// Reporter that renders each publication as a structured log line.
    ///
    /// Useful while wiring a deployment: the emitted topic/payload pairs
    /// are exactly what a broker-backed reporter would publish.
    #[derive(Clone, Debug)]
    pub struct LogReporter {
        connection_id: String,
        customer_id: String,
    }

    impl LogReporter {
        /// Creates a reporter rendering topics for the given gateway
        /// connection and customer.
        pub fn new(connection_id: impl Into<String>, customer_id: impl Into<String>) -> Self {
            Self {
                connection_id: connection_id.into(),
                customer_id: customer_id.into(),
            }
        }

        fn emit(&self, spec: &TopicSpec, payload: &impl serde::Serialize) -> Result<(), ReportError> {
            let payload = serde_json::to_string(payload)?;
            tracing::info!(
                topic = %spec.topic,
                retain = spec.retain,
                %payload,
                "care publish"
            );
            Ok(())
        }
    }

    #[async_trait]
    impl Reporter for LogReporter {
        async fn register_device(&self, factsheet: &DeviceFactsheet) -> Result<(), ReportError> {
            let spec =
                TopicSpec::factsheet(&self.connection_id, &self.customer_id, &factsheet.serial);
            self.emit(&spec, factsheet)
        }

        async fn connect_device(&self, serial: &str) -> Result<(), ReportError> {
            let spec = TopicSpec::connection(&self.connection_id, &self.customer_id, serial);
            self.emit(&spec, &Connection::now(ConnectionStatus::Online))
        }

        async fn disconnect_device(&self, serial: &str) -> Result<(), ReportError> {
            let spec = TopicSpec::connection(&self.connection_id, &self.customer_id, serial);
            self.emit(&spec, &Connection::now(ConnectionStatus::Offline))
        }

        async fn publish_errors(
            &self,
            serial: &str,
            errors: &DeviceErrors,
        ) -> Result<(), ReportError> {
            let spec = TopicSpec::errors(&self.connection_id, &self.customer_id, serial);
            self.emit(&spec, errors)
        }
    }
}

#[cfg(feature = "logging")]
pub use log_reporter::LogReporter;
