//! Error types used by the cellvisor runtime and streaming tasks.
//!
//! This module defines the main error enums:
//!
//! - [`RuntimeError`] - errors raised by the supervision runtime itself.
//! - [`CellError`] - errors surfaced by the external cell API.
//! - [`SyncError`] - errors raised by per-controller streaming tasks.
//! - [`ReportError`] - errors raised by the fleet-care reporting transport.
//! - [`ConfigError`] - invalid runtime configuration.
//!
//! All types provide `as_label` helpers producing short stable snake_case
//! labels for logs and metrics.

use std::time::Duration;
use thiserror::Error;

use crate::cell::ControllerId;

/// Errors produced by the cellvisor runtime.
///
/// These represent failures of the supervision loop itself, not of
/// individual controllers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some streams remained stuck.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Controllers whose streams did not shut down in time.
        stuck: Vec<ControllerId>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Errors surfaced by the external cell API.
///
/// The cell (vendor SDK) is an opaque collaborator; its failures are
/// reduced to the categories the runtime reacts to. Discovery errors are
/// retried on the next poll cycle, stream errors restart the affected
/// stream only.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum CellError {
    /// The cell API could not be reached (endpoint down, auth failure).
    #[error("cell api unavailable: {reason}")]
    Unavailable {
        /// Transport-level detail.
        reason: String,
    },

    /// The controller is not (or no longer) known to the cell.
    #[error("controller {controller} unknown to the cell")]
    UnknownController {
        /// The controller that was requested.
        controller: ControllerId,
    },

    /// An open state stream was interrupted by the cell.
    #[error("state stream interrupted: {reason}")]
    StreamInterrupted {
        /// Transport-level detail.
        reason: String,
    },
}

impl CellError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CellError::Unavailable { .. } => "cell_unavailable",
            CellError::UnknownController { .. } => "cell_unknown_controller",
            CellError::StreamInterrupted { .. } => "cell_stream_interrupted",
        }
    }
}

/// Errors produced by one attempt of a per-controller streaming task.
///
/// The stream actor classifies these to decide between a graceful stop
/// ([`SyncError::Canceled`]) and a restart with backoff (everything else).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SyncError {
    /// The task observed cancellation and released its resources.
    #[error("context cancelled")]
    Canceled,

    /// A cell API call failed (describe, open stream, stream item).
    #[error(transparent)]
    Cell(#[from] CellError),

    /// The state stream ended. A controller stream is expected to be
    /// continuous, so a clean end still triggers a restart.
    #[error("state stream ended")]
    StreamEnded,

    /// Device registration against the fleet-care surface failed.
    #[error("device registration failed: {0}")]
    Register(#[source] ReportError),
}

impl SyncError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SyncError::Canceled => "sync_canceled",
            SyncError::Cell(e) => e.as_label(),
            SyncError::StreamEnded => "sync_stream_ended",
            SyncError::Register(_) => "sync_register_failed",
        }
    }
}

/// Errors raised by a [`Reporter`](crate::care::Reporter) implementation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ReportError {
    /// The underlying transport rejected or lost the publication.
    #[error("report transport failed: {reason}")]
    Transport {
        /// Transport-level detail.
        reason: String,
    },

    /// The payload could not be serialized.
    #[error("report payload not serializable: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors raised while loading runtime configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// The environment variable name.
        var: &'static str,
        /// The offending value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}
