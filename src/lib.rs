//! # cellvisor
//!
//! **Cellvisor** keeps one supervised state stream per robot controller in
//! a cell: it polls the cell for the current controller set, starts a
//! streaming task for every controller that appears, stops the task of
//! every controller that disappears, and revives streams that fail. Each
//! stream mirrors safety-state transitions into a fleet-care surface.
//!
//! The vendor SDK ([`CellApi`]) and the care transport ([`Reporter`]) are
//! trait seams; the crate supervises, it does not speak to hardware.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!           ┌─────────────────────────────────────────────────┐
//!           │  Supervisor (poll / reconcile / shutdown)       │
//!           │  - Bus (broadcast events)                       │
//!           │  - Registry (ControllerId → stream handle)      │
//!           │  - SubscriberSet (fans out to subscribers)      │
//!           │  - StreamHealth (liveness + restart counts)     │
//!           └────┬──────────────────┬──────────────────┬──────┘
//!                ▼                  ▼                  ▼
//!           ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//!           │ StreamActor  │  │ StreamActor  │  │ StreamActor  │
//!           │ (restart     │  │              │  │              │
//!           │  w/ backoff) │  │              │  │              │
//!           └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!                  ▼                 ▼                 ▼
//!             StateSync         StateSync         StateSync
//!           (one controller's state stream → fleet-care reports)
//! ```
//!
//! ### Lifecycle
//! ```text
//! every poll_interval:
//!   list_controllers() ──► reconcile(desired, tracked)
//!       │ err: DiscoveryFailed, retry next cycle
//!       ├─ to_stop:  cancel token once, await release
//!       └─ to_start: spawn StreamActor
//!                      └─► loop {
//!                            StateSync::run(child_token)
//!                            ├─ Err(Canceled) ─► exit
//!                            └─ Err(_)/stream end ─► backoff, retry
//!                          }
//! on signal: cancel all, await within grace
//! ```
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use cellvisor::{sim::SimCell, Config, Supervisor};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cell = SimCell::new();
//!     cell.add_controller("ur");
//!
//!     let supervisor = Supervisor::builder(Config::default()).build(Arc::new(cell));
//!
//!     // Runs until SIGINT/SIGTERM; use run_until(token) for embedding.
//!     supervisor.run().await?;
//!     Ok(())
//! }
//! ```

mod care;
mod cell;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use care::{
    timestamp_now, Connection, ConnectionStatus, DeviceErrors, DeviceFactsheet, ErrorReport,
    NoopReporter, QosClass, Reporter, TopicSpec,
};
pub use cell::{CellApi, ControllerId, ControllerInfo, SafetyState, StateEvent, StateStream};
pub use core::{reconcile, Config, Phase, Plan, Supervisor, SupervisorBuilder};
pub use error::{CellError, ConfigError, ReportError, RuntimeError, SyncError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, RestartPolicy};
pub use subscribers::{StreamHealth, StreamStats, Subscribe, SubscriberSet};
pub use tasks::{ControllerTask, StateSync};

// Optional: tracing-backed built-ins.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use care::LogReporter;
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

// Optional: in-memory cell for demos and tests.
// Enable with: `--features sim`
#[cfg(feature = "sim")]
pub mod sim;
