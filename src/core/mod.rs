//! Runtime core: discovery, reconciliation and stream lifecycle.
//!
//! The public API from this module is [`Supervisor`] (with its builder)
//! and [`Config`]; [`reconcile`] and [`Plan`] are exposed for callers that
//! want to compute diffs themselves.
//!
//! Internal modules:
//! - [`supervisor`]: poll loop, reconciliation, graceful shutdown;
//! - [`registry`]: tracked controllers and their per-stream handles;
//! - [`actor`]: runs one controller's stream with restart policy/backoff;
//! - [`runner`]: executes one attempt and publishes its terminal event;
//! - [`reconcile`]: pure desired-vs-tracked diff;
//! - [`shutdown`]: cross-platform shutdown signal handling.
//!
//! ## Wiring
//! ```text
//! Supervisor::run()
//!   ├─► poll list_controllers() every poll_interval
//!   │        │ ok                        │ err
//!   │        ▼                           ▼
//!   │   reconcile(desired, tracked)   DiscoveryFailed (retry next cycle)
//!   │        │
//!   │        ├─ to_stop  ─► Registry::remove (cancel once, await join)
//!   │        └─ to_start ─► StreamActor::run per controller
//!   │                          └─► runner::run_once(StateSync)
//!   │                                └─► restart w/ backoff on failure
//!   └─► on signal: cancel all, await within grace
//! ```

mod actor;
mod builder;
mod config;
mod reconcile;
mod registry;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::Config;
pub use reconcile::{reconcile, Plan};
pub use registry::Phase;
pub use supervisor::Supervisor;
