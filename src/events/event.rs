//! Runtime events emitted by the supervisor and stream actors.
//!
//! [`EventKind`] classifies events across three areas:
//! - **Discovery events**: poll outcomes and reconciliation effects
//! - **Stream lifecycle events**: per-controller attempt flow
//! - **Shutdown events**: signal handling and grace accounting
//!
//! The [`Event`] struct carries optional metadata such as the controller,
//! failure reasons, attempt numbers and backoff delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::cell::ControllerId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Discovery / reconciliation ===
    /// A discovery poll succeeded.
    ///
    /// Sets: `desired`, `tracked` (set sizes before reconciliation).
    DiscoveryCompleted,

    /// A discovery poll failed; retried on the next cycle.
    ///
    /// Sets: `reason`.
    DiscoveryFailed,

    /// A controller entered the tracked set; its stream actor was spawned.
    ///
    /// Sets: `controller`.
    ControllerAdded,

    /// A controller left the tracked set; its actor was cancelled and
    /// joined.
    ///
    /// Sets: `controller`.
    ControllerRemoved,

    // === Stream lifecycle ===
    /// A stream attempt is starting.
    ///
    /// Sets: `controller`, `attempt` (1-based, per actor).
    StreamStarting,

    /// A stream attempt stopped gracefully (cancellation).
    ///
    /// Sets: `controller`, `attempt`.
    StreamStopped,

    /// A stream attempt failed or the stream ended.
    ///
    /// Sets: `controller`, `attempt`, `reason`.
    StreamFailed,

    /// The actor scheduled the next attempt after a failure.
    ///
    /// Sets: `controller`, `attempt` (the failed one), `delay_ms`,
    /// `reason`.
    RestartScheduled,

    // === Shutdown ===
    /// Shutdown requested (OS signal observed or token cancelled).
    ShutdownRequested,

    /// All streams stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some streams did not stop in time.
    GraceExceeded,

    // === Subscriber plumbing ===
    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (subscriber and cause).
    SubscriberOverflow,

    /// A subscriber panicked while processing an event.
    ///
    /// Sets: `reason` (panic info).
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Controller the event refers to, if any.
    pub controller: Option<ControllerId>,
    /// Human-readable reason (errors, overflow details).
    pub reason: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Size of the desired set (discovery events).
    pub desired: Option<usize>,
    /// Size of the tracked set (discovery events).
    pub tracked: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            controller: None,
            reason: None,
            attempt: None,
            delay_ms: None,
            desired: None,
            tracked: None,
        }
    }

    /// Attaches a controller.
    #[inline]
    pub fn with_controller(mut self, controller: ControllerId) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches desired/tracked set sizes.
    #[inline]
    pub fn with_sets(mut self, desired: usize, tracked: usize) -> Self {
        self.desired = Some(desired);
        self.tracked = Some(tracked);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, cause: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} cause={cause}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::now(EventKind::StreamStarting);
        let b = Event::now(EventKind::StreamStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builder_fields() {
        let ev = Event::now(EventKind::RestartScheduled)
            .with_controller(ControllerId::new("ur"))
            .with_reason("boom")
            .with_attempt(3)
            .with_delay(Duration::from_secs(5));

        assert_eq!(ev.controller.as_ref().map(|c| c.as_str()), Some("ur"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
        assert_eq!(ev.attempt, Some(3));
        assert_eq!(ev.delay_ms, Some(5_000));
    }
}
