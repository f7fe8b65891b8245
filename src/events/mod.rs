//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the supervisor,
//! registry, stream actors and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (discovery/reconcile/shutdown),
//!   `Registry` (add/remove), `StreamActor` and `runner::run_once`
//!   (stream lifecycle), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's subscriber listener, which fans out
//!   to the [`SubscriberSet`](crate::subscribers::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
