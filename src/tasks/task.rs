//! Task abstraction for per-controller work.
//!
//! A task receives a [`CancellationToken`] and should check it at its
//! await points to stop cooperatively during removal or shutdown.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::cell::ControllerId;
use crate::error::SyncError;

/// Asynchronous, cancelable unit of work tied to one controller.
///
/// Implementors should observe `ctx` at their await points, release any
/// held resources when it fires, and return [`SyncError::Canceled`] so the
/// actor can tell a graceful stop from a failure.
#[async_trait]
pub trait ControllerTask: Send + Sync + 'static {
    /// The controller this task works on.
    fn controller(&self) -> &ControllerId;

    /// Executes the task until it fails, its stream ends, or `ctx` is
    /// cancelled.
    async fn run(&self, ctx: CancellationToken) -> Result<(), SyncError>;
}
