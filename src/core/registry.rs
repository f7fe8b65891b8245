//! Tracked controllers and their stream handles.
//!
//! The registry owns the `ControllerId → Handle` map. Only the
//! supervisor's reconciliation step mutates it (single-writer
//! discipline); actors never touch the registry.
//!
//! ## Per-controller lifecycle
//! ```text
//! absent ──insert──► Starting ──next cycle──► Running
//!    ▲                   │                       │
//!    └───── joined ◄── Stopping ◄── remove ──────┘
//! ```
//!
//! ## Rules
//! - At most one live actor per `ControllerId`.
//! - `remove` cancels the handle's token exactly once (guarded by the
//!   `Stopping` phase) and awaits the actor's join before the entry
//!   leaves the map; cleanup is complete only once the stream handle has
//!   been dropped.
//! - A panicked actor is reaped by `sweep_finished`; the controller
//!   re-enters through the next reconcile plan.

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cell::ControllerId;
use crate::core::actor::ActorExit;
use crate::events::{Bus, Event, EventKind};

/// Lifecycle phase of one tracked controller.
///
/// `absent` is represented by the controller not being in the map.
/// Transitions are driven only by the supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Actor spawned this cycle.
    Starting,
    /// Actor survived at least one full cycle.
    Running,
    /// Cancelled, waiting for the join to complete.
    Stopping,
}

/// Handle to one controller's running stream actor.
///
/// `join` is taken while the actor is being stopped or reaped; the entry
/// itself stays in the map until the join completes.
struct Handle {
    join: Option<JoinHandle<ActorExit>>,
    cancel: CancellationToken,
    phase: Phase,
}

/// Map of tracked controllers, mutated only by the supervisor.
pub(crate) struct Registry {
    streams: Mutex<HashMap<ControllerId, Handle>>,
    bus: Bus,
}

impl Registry {
    pub(crate) fn new(bus: Bus) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            bus,
        }
    }

    /// Snapshot of the tracked set.
    pub(crate) async fn tracked(&self) -> HashSet<ControllerId> {
        self.streams.lock().await.keys().cloned().collect()
    }

    /// Phase of one controller, `None` when absent.
    pub(crate) async fn phase(&self, controller: &ControllerId) -> Option<Phase> {
        self.streams.lock().await.get(controller).map(|h| h.phase)
    }

    pub(crate) async fn is_empty(&self) -> bool {
        self.streams.lock().await.is_empty()
    }

    /// Registers a freshly spawned actor.
    ///
    /// Returns false (and aborts the surplus actor) if the controller is
    /// already tracked; the one-actor-per-controller invariant is kept by
    /// refusing the second one.
    pub(crate) async fn insert(
        &self,
        controller: ControllerId,
        join: JoinHandle<ActorExit>,
        cancel: CancellationToken,
    ) -> bool {
        let mut streams = self.streams.lock().await;
        if streams.contains_key(&controller) {
            join.abort();
            return false;
        }
        streams.insert(
            controller.clone(),
            Handle {
                join: Some(join),
                cancel,
                phase: Phase::Starting,
            },
        );
        drop(streams);
        self.bus
            .publish(Event::now(EventKind::ControllerAdded).with_controller(controller));
        true
    }

    /// Promotes every `Starting` entry to `Running`.
    ///
    /// Called once per cycle; an entry that survives its first full cycle
    /// is considered running.
    pub(crate) async fn promote_started(&self) {
        let mut streams = self.streams.lock().await;
        for handle in streams.values_mut() {
            if handle.phase == Phase::Starting {
                handle.phase = Phase::Running;
            }
        }
    }

    /// Cancels one controller's actor and awaits its release.
    pub(crate) async fn remove(&self, controller: &ControllerId) {
        let join = {
            let mut streams = self.streams.lock().await;
            let handle = match streams.get_mut(controller) {
                Some(h) => h,
                None => return,
            };
            if handle.phase == Phase::Stopping {
                return;
            }
            handle.phase = Phase::Stopping;
            handle.cancel.cancel();
            handle.join.take()
        };

        if let Some(join) = join {
            self.join_quietly(controller, join).await;
        }
        self.streams.lock().await.remove(controller);
        self.bus
            .publish(Event::now(EventKind::ControllerRemoved).with_controller(controller.clone()));
    }

    /// Reaps actors that terminated on their own (panic is the only such
    /// path for stream actors). Returns the affected controllers so the
    /// caller can restart the desired ones.
    pub(crate) async fn sweep_finished(&self) -> Vec<ControllerId> {
        let mut reaped = Vec::new();
        let finished: Vec<(ControllerId, JoinHandle<ActorExit>)> = {
            let mut streams = self.streams.lock().await;
            let ids: Vec<ControllerId> = streams
                .iter()
                .filter(|(_, h)| h.join.as_ref().is_some_and(|j| j.is_finished()))
                .map(|(c, _)| c.clone())
                .collect();
            ids.into_iter()
                .filter_map(|c| {
                    streams
                        .get_mut(&c)
                        .and_then(|h| h.join.take())
                        .map(|j| (c, j))
                })
                .collect()
        };

        for (controller, join) in finished {
            self.join_quietly(&controller, join).await;
            self.streams.lock().await.remove(&controller);
            self.bus.publish(
                Event::now(EventKind::ControllerRemoved).with_controller(controller.clone()),
            );
            reaped.push(controller);
        }
        reaped
    }

    /// Cancels every actor, then awaits all joins.
    ///
    /// The caller bounds this with the grace timeout.
    pub(crate) async fn drain(&self) {
        let handles: Vec<(ControllerId, Option<JoinHandle<ActorExit>>)> = {
            let mut streams = self.streams.lock().await;
            let drained: Vec<(ControllerId, Handle)> = streams.drain().collect();
            drained
                .into_iter()
                .map(|(c, mut h)| {
                    h.cancel.cancel();
                    (c, h.join.take())
                })
                .collect()
        };

        for (controller, join) in handles {
            if let Some(join) = join {
                self.join_quietly(&controller, join).await;
            }
            self.bus
                .publish(Event::now(EventKind::ControllerRemoved).with_controller(controller));
        }
    }

    /// Awaits one join; a panic is reported as a stream failure.
    async fn join_quietly(&self, controller: &ControllerId, join: JoinHandle<ActorExit>) {
        if let Err(join_err) = join.await {
            self.bus.publish(
                Event::now(EventKind::StreamFailed)
                    .with_controller(controller.clone())
                    .with_reason(format!("actor panicked: {join_err}")),
            );
        }
    }
}
