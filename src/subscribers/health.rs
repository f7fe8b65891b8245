//! Stream health tracker with sequence-based ordering.
//!
//! Maintains the authoritative view of which controller streams are
//! currently up and how often each one has been restarted, using event
//! sequence numbers to handle out-of-order delivery.
//!
//! ## Rules
//! - `StreamStarting` marks a stream up, `StreamStopped`/`StreamFailed`
//!   mark it down, `RestartScheduled` increments the restart counter.
//! - Events with `seq <= last_seq` for a controller are rejected (stale).
//! - `ControllerRemoved` forgets the controller entirely.
//! - Read operations are eventually consistent with the bus.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cell::ControllerId;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Health snapshot of one controller stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// True while an attempt is running.
    pub up: bool,
    /// Number of restarts scheduled since the stream was first started.
    pub restarts: u64,
}

#[derive(Debug, Default)]
struct TrackedStream {
    last_seq: u64,
    stats: StreamStats,
}

/// Thread-safe tracker of stream liveness and restart counts.
///
/// ### Responsibilities
/// - Provides snapshots for graceful shutdown (stuck stream detection)
/// - Exposes restart counts for monitoring
#[derive(Debug, Default)]
pub struct StreamHealth {
    state: RwLock<HashMap<ControllerId, TrackedStream>>,
}

impl StreamHealth {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event; returns true if it changed the tracked state.
    async fn update(&self, ev: &Event) -> bool {
        let controller = match &ev.controller {
            Some(c) => c,
            None => return false,
        };

        if ev.kind == EventKind::ControllerRemoved {
            return self.state.write().await.remove(controller).is_some();
        }

        let mut state = self.state.write().await;
        let entry = state.entry(controller.clone()).or_default();

        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;

        match ev.kind {
            EventKind::StreamStarting => {
                entry.stats.up = true;
                true
            }
            EventKind::StreamStopped | EventKind::StreamFailed => {
                entry.stats.up = false;
                true
            }
            EventKind::RestartScheduled => {
                entry.stats.restarts += 1;
                true
            }
            _ => false,
        }
    }

    /// Returns the stats for one controller, if tracked.
    pub async fn stats(&self, controller: &ControllerId) -> Option<StreamStats> {
        self.state.read().await.get(controller).map(|t| t.stats)
    }

    /// Returns the restart count for one controller (0 if untracked).
    pub async fn restarts(&self, controller: &ControllerId) -> u64 {
        self.stats(controller).await.map(|s| s.restarts).unwrap_or(0)
    }

    /// Returns the sorted list of controllers whose stream is currently
    /// up. Used at shutdown to name streams that did not stop within
    /// grace.
    pub async fn up_snapshot(&self) -> Vec<ControllerId> {
        let state = self.state.read().await;
        let mut up: Vec<ControllerId> = state
            .iter()
            .filter(|(_, t)| t.stats.up)
            .map(|(c, _)| c.clone())
            .collect();
        up.sort_unstable();
        up
    }
}

#[async_trait]
impl Subscribe for StreamHealth {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn name(&self) -> &'static str {
        "stream-health"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventKind, controller: &str) -> Event {
        Event::now(kind).with_controller(ControllerId::new(controller))
    }

    #[tokio::test]
    async fn test_starting_marks_up_and_failure_marks_down() {
        let health = StreamHealth::new();
        let id = ControllerId::new("ur");

        health.update(&ev(EventKind::StreamStarting, "ur")).await;
        assert!(health.stats(&id).await.unwrap().up);

        health.update(&ev(EventKind::StreamFailed, "ur")).await;
        assert!(!health.stats(&id).await.unwrap().up);
    }

    #[tokio::test]
    async fn test_restart_counter_accumulates() {
        let health = StreamHealth::new();
        let id = ControllerId::new("ur");

        health.update(&ev(EventKind::StreamStarting, "ur")).await;
        health.update(&ev(EventKind::StreamFailed, "ur")).await;
        health.update(&ev(EventKind::RestartScheduled, "ur")).await;
        health.update(&ev(EventKind::RestartScheduled, "ur")).await;

        assert_eq!(health.restarts(&id).await, 2);
    }

    #[tokio::test]
    async fn test_stale_events_are_rejected() {
        let health = StreamHealth::new();
        let id = ControllerId::new("ur");

        let start = ev(EventKind::StreamStarting, "ur");
        let stop = ev(EventKind::StreamStopped, "ur");
        // Apply out of order: the later-sequenced stop first.
        assert!(health.update(&stop).await);
        assert!(!health.update(&start).await, "stale event must be rejected");
        assert!(!health.stats(&id).await.unwrap().up);
    }

    #[tokio::test]
    async fn test_removed_controller_is_forgotten() {
        let health = StreamHealth::new();
        let id = ControllerId::new("ur");

        health.update(&ev(EventKind::StreamStarting, "ur")).await;
        health.update(&ev(EventKind::ControllerRemoved, "ur")).await;
        assert!(health.stats(&id).await.is_none());
        assert!(health.up_snapshot().await.is_empty());
    }
}
