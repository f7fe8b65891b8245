//! Supervisor: discovery polling, reconciliation and graceful shutdown.
//!
//! The [`Supervisor`] owns the event bus, the tracked-controller
//! [`Registry`] and the subscriber fan-out. It polls the cell on a fixed
//! cadence, diffs the result against the tracked set and adjusts the
//! running stream actors.
//!
//! ## Key responsibilities
//! - poll `CellApi::list_controllers` every `Config::poll_interval`
//! - apply the [`reconcile`] plan: start new streams, stop vanished ones
//! - reap panicked actors so their controllers restart next cycle
//! - fan out runtime events to subscribers
//! - handle OS termination signals and drain within `Config::grace`
//!
//! ## Failure containment
//! - A failed poll publishes `DiscoveryFailed` and is retried on the next
//!   cycle; the supervisor never exits because of the cell.
//! - A failed stream is restarted by its own actor with backoff; other
//!   controllers' actors are separate tokio tasks and unaffected.
//! - The tracked map is touched only inside the supervisor's cycle
//!   (single-writer discipline); actors never reach into it.

use std::sync::Arc;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::care::Reporter;
use crate::cell::{CellApi, ControllerId};
use crate::core::actor::StreamActor;
use crate::core::builder::SupervisorBuilder;
use crate::core::reconcile::reconcile;
use crate::core::registry::{Phase, Registry};
use crate::core::{shutdown, Config};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::RestartPolicy;
use crate::subscribers::{StreamHealth, SubscriberSet};
use crate::tasks::{ControllerTask, StateSync};

/// Coordinates discovery, per-controller stream actors and shutdown.
///
/// Build one with [`Supervisor::builder`]; construction spawns the
/// subscriber workers, so it must happen inside a tokio runtime.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use cellvisor::{Config, Supervisor};
/// # async fn demo(cell: Arc<dyn cellvisor::CellApi>) -> Result<(), Box<dyn std::error::Error>> {
/// let supervisor = Supervisor::builder(Config::default()).build(cell);
/// supervisor.run().await?;   // until SIGINT/SIGTERM
/// # Ok(())
/// # }
/// ```
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    health: Arc<StreamHealth>,
    registry: Registry,
    cell: Arc<dyn CellApi>,
    reporter: Arc<dyn Reporter>,
}

impl Supervisor {
    /// Starts building a supervisor with the given configuration.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        health: Arc<StreamHealth>,
        registry: Registry,
        cell: Arc<dyn CellApi>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            health,
            registry,
            cell,
            reporter,
        }
    }

    /// The event bus; subscribe for ad hoc observation.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Liveness and restart counts per controller.
    pub fn health(&self) -> &Arc<StreamHealth> {
        &self.health
    }

    /// Snapshot of the tracked controller set.
    pub async fn tracked(&self) -> std::collections::HashSet<ControllerId> {
        self.registry.tracked().await
    }

    /// Lifecycle phase of one controller, `None` when untracked.
    pub async fn phase(&self, controller: &ControllerId) -> Option<Phase> {
        self.registry.phase(controller).await
    }

    /// Runs until the process receives a termination signal, then drains
    /// all streams within the configured grace period.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        let shutdown_token = CancellationToken::new();
        let trigger = shutdown_token.clone();
        tokio::spawn(async move {
            if shutdown::wait_for_shutdown_signal().await.is_ok() {
                trigger.cancel();
            }
        });
        self.run_until(shutdown_token).await
    }

    /// Runs until `shutdown` is cancelled, then drains all streams within
    /// the configured grace period.
    ///
    /// The first poll happens immediately, subsequent ones every
    /// `Config::poll_interval`.
    pub async fn run_until(&self, shutdown: CancellationToken) -> Result<(), RuntimeError> {
        self.subscriber_listener();

        let mut ticker = time::interval(self.cfg.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.cycle(&shutdown).await,
            }
        }

        self.bus.publish(Event::now(EventKind::ShutdownRequested));
        self.drain_with_grace().await
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget).
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged; events skipped");
                    }
                }
            }
        });
    }

    /// One discovery/reconciliation cycle.
    async fn cycle(&self, shutdown: &CancellationToken) {
        // Reap panicked actors first so their controllers re-enter via
        // the plan below.
        let reaped = self.registry.sweep_finished().await;
        if !reaped.is_empty() {
            tracing::warn!(count = reaped.len(), "replaced dead stream actors");
        }
        self.registry.promote_started().await;

        let desired = match self.cell.list_controllers().await {
            Ok(desired) => desired,
            Err(e) => {
                self.bus
                    .publish(Event::now(EventKind::DiscoveryFailed).with_reason(e.to_string()));
                return;
            }
        };

        let tracked = self.registry.tracked().await;
        self.bus.publish(
            Event::now(EventKind::DiscoveryCompleted).with_sets(desired.len(), tracked.len()),
        );

        let plan = reconcile(&desired, &tracked);
        for controller in &plan.to_stop {
            self.registry.remove(controller).await;
        }
        for controller in plan.to_start {
            self.start_stream(controller, shutdown).await;
        }
    }

    /// Spawns the stream actor for one controller and registers it.
    async fn start_stream(&self, controller: ControllerId, shutdown: &CancellationToken) {
        let task: Arc<dyn ControllerTask> = Arc::new(StateSync::new(
            controller.clone(),
            Arc::clone(&self.cell),
            Arc::clone(&self.reporter),
            self.cfg.deployment.clone(),
        ));
        let actor = StreamActor::new(
            task,
            RestartPolicy::Always { interval: None },
            self.cfg.backoff,
            self.bus.clone(),
        );

        let token = shutdown.child_token();
        let join = tokio::spawn(actor.run(token.clone()));
        self.registry.insert(controller, join, token).await;
    }

    /// Cancels every stream and waits up to `Config::grace` for release.
    async fn drain_with_grace(&self) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        match time::timeout(grace, self.registry.drain()).await {
            Ok(()) => {
                self.bus.publish(Event::now(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                self.bus.publish(Event::now(EventKind::GraceExceeded));
                let stuck = self.health.up_snapshot().await;
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}
