//! Event subscribers for the cellvisor runtime.
//!
//! This module provides the [`Subscribe`] trait and built-in
//! implementations for handling runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! StreamActor ── publish(Event) ──► Bus ──► supervisor listener
//!                                               │
//!                                          SubscriberSet
//!                                     ┌─────────┼─────────┐
//!                                     ▼         ▼         ▼
//!                                LogWriter  StreamHealth  custom
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** observe and react (logging, metrics, alerts)
//! - **Stateful subscribers** maintain state from events
//!   ([`StreamHealth`] tracks per-controller liveness and restart counts)

mod health;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use health::{StreamHealth, StreamStats};
pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
