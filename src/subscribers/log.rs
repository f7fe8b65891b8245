//! Tracing-backed logging subscriber.
//!
//! [`LogWriter`] renders runtime events as structured `tracing` records:
//! stream failures and shutdown anomalies at `warn`, the regular lifecycle
//! at `info`, per-attempt noise at `debug`.

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Built-in subscriber that logs every runtime event via `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new logging subscriber.
    pub fn new() -> Self {
        Self
    }
}

fn controller(ev: &Event) -> &str {
    ev.controller.as_ref().map(|c| c.as_str()).unwrap_or("-")
}

fn reason(ev: &Event) -> &str {
    ev.reason.as_deref().unwrap_or("-")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::DiscoveryCompleted => tracing::debug!(
                desired = ev.desired.unwrap_or(0),
                tracked = ev.tracked.unwrap_or(0),
                "discovery completed"
            ),
            EventKind::DiscoveryFailed => {
                tracing::warn!(reason = reason(ev), "discovery failed; retrying next cycle")
            }
            EventKind::ControllerAdded => {
                tracing::info!(controller = controller(ev), "controller added")
            }
            EventKind::ControllerRemoved => {
                tracing::info!(controller = controller(ev), "controller removed")
            }
            EventKind::StreamStarting => tracing::debug!(
                controller = controller(ev),
                attempt = ev.attempt.unwrap_or(0),
                "stream starting"
            ),
            EventKind::StreamStopped => {
                tracing::debug!(controller = controller(ev), "stream stopped")
            }
            EventKind::StreamFailed => tracing::warn!(
                controller = controller(ev),
                attempt = ev.attempt.unwrap_or(0),
                reason = reason(ev),
                "stream failed"
            ),
            EventKind::RestartScheduled => tracing::info!(
                controller = controller(ev),
                delay_ms = ev.delay_ms.unwrap_or(0),
                reason = reason(ev),
                "restart scheduled"
            ),
            EventKind::ShutdownRequested => tracing::info!("shutdown requested"),
            EventKind::AllStoppedWithin => tracing::info!("all streams stopped within grace"),
            EventKind::GraceExceeded => tracing::warn!("shutdown grace exceeded"),
            EventKind::SubscriberOverflow => {
                tracing::warn!(reason = reason(ev), "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(reason = reason(ev), "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
