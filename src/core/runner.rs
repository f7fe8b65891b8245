//! Run a single attempt of a controller task.
//!
//! Executes one attempt and publishes its terminal event to the
//! [`Bus`].
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event per attempt:
//!   `StreamStopped` or `StreamFailed`.
//! - `Canceled` is treated as a graceful exit → `StreamStopped`.
//! - Derives a **child token** per attempt (isolated cancellation; a
//!   child cancelled mid-attempt does not affect the parent).
//! - No per-attempt timeout: a state stream is expected to run
//!   indefinitely, and the poll interval is the only cadence the runtime
//!   imposes.

use tokio_util::sync::CancellationToken;

use crate::error::SyncError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::ControllerTask;

/// Executes a single attempt of `task`, publishing its terminal event.
pub(crate) async fn run_once<T: ControllerTask + ?Sized>(
    task: &T,
    parent: &CancellationToken,
    attempt: u32,
    bus: &Bus,
) -> Result<(), SyncError> {
    let child = parent.child_token();
    let res = task.run(child).await;

    let controller = task.controller().clone();
    match res {
        Ok(()) => {
            bus.publish(
                Event::now(EventKind::StreamStopped)
                    .with_controller(controller)
                    .with_attempt(attempt),
            );
            Ok(())
        }
        Err(SyncError::Canceled) => {
            bus.publish(
                Event::now(EventKind::StreamStopped)
                    .with_controller(controller)
                    .with_attempt(attempt),
            );
            Err(SyncError::Canceled)
        }
        Err(e) => {
            bus.publish(
                Event::now(EventKind::StreamFailed)
                    .with_controller(controller)
                    .with_attempt(attempt)
                    .with_reason(e.to_string()),
            );
            Err(e)
        }
    }
}
