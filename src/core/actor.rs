//! Stream actor: supervises one controller's streaming task.
//!
//! Runs attempts of a [`ControllerTask`] back to back, applying the
//! restart policy and backoff between attempts.
//!
//! ## Event flow
//! ```text
//! loop {
//!   ├─► publish StreamStarting { controller, attempt }
//!   ├─► runner::run_once()
//!   │       ├─ Ok            ─► StreamStopped
//!   │       ├─ Err(Canceled) ─► StreamStopped, actor exits
//!   │       └─ Err(e)        ─► StreamFailed
//!   ├─► apply RestartPolicy
//!   └─► if retry: publish RestartScheduled, cancellable sleep
//! }
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially** within one actor, never in parallel.
//! - The attempt counter increments per attempt and never resets; the
//!   backoff index counts **consecutive failures** and resets on success.
//! - Cancellation is observed at safe points (before an attempt, during
//!   backoff sleep) and inside the task via its child token.

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::core::runner::run_once;
use crate::error::SyncError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{BackoffPolicy, RestartPolicy};
use crate::tasks::ControllerTask;

/// Why an actor's loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActorExit {
    /// The runtime token fired; the task released its resources.
    Canceled,
    /// The restart policy forbade another attempt.
    Exhausted,
}

/// Supervises execution of a single [`ControllerTask`] with restarts,
/// backoff and event publishing.
pub(crate) struct StreamActor {
    task: Arc<dyn ControllerTask>,
    restart: RestartPolicy,
    backoff: BackoffPolicy,
    bus: Bus,
}

impl StreamActor {
    pub(crate) fn new(
        task: Arc<dyn ControllerTask>,
        restart: RestartPolicy,
        backoff: BackoffPolicy,
        bus: Bus,
    ) -> Self {
        Self {
            task,
            restart,
            backoff,
            bus,
        }
    }

    /// Runs the actor until cancellation or restart exhaustion.
    pub(crate) async fn run(self, runtime_token: CancellationToken) -> ActorExit {
        let mut attempt: u32 = 0;
        let mut failures: u32 = 0;

        loop {
            if runtime_token.is_cancelled() {
                return ActorExit::Canceled;
            }

            attempt += 1;
            self.bus.publish(
                Event::now(EventKind::StreamStarting)
                    .with_controller(self.task.controller().clone())
                    .with_attempt(attempt),
            );

            let res = run_once(self.task.as_ref(), &runtime_token, attempt, &self.bus).await;

            match res {
                Ok(()) => {
                    failures = 0;
                    match self.restart {
                        RestartPolicy::Never | RestartPolicy::OnFailure => {
                            return ActorExit::Exhausted;
                        }
                        RestartPolicy::Always { interval } => {
                            if let Some(delay) = interval {
                                if !self.sleep_cancellable(delay, &runtime_token).await {
                                    return ActorExit::Canceled;
                                }
                            }
                        }
                    }
                }
                Err(SyncError::Canceled) => return ActorExit::Canceled,
                Err(e) => {
                    if matches!(self.restart, RestartPolicy::Never) {
                        return ActorExit::Exhausted;
                    }

                    let delay = self.backoff.next(failures);
                    failures = failures.saturating_add(1);

                    self.bus.publish(
                        Event::now(EventKind::RestartScheduled)
                            .with_controller(self.task.controller().clone())
                            .with_attempt(attempt)
                            .with_delay(delay)
                            .with_reason(e.to_string()),
                    );

                    if !self.sleep_cancellable(delay, &runtime_token).await {
                        return ActorExit::Canceled;
                    }
                }
            }
        }
    }

    /// Sleeps for `delay`; returns false if cancelled first.
    async fn sleep_cancellable(&self, delay: std::time::Duration, token: &CancellationToken) -> bool {
        let sleep = time::sleep(delay);
        tokio::pin!(sleep);
        select! {
            _ = &mut sleep => true,
            _ = token.cancelled() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::ControllerId;
    use crate::policies::JitterPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Task failing a fixed number of times, then blocking until
    /// cancelled.
    struct Flaky {
        controller: ControllerId,
        failures_left: AtomicU32,
        runs: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self {
                controller: ControllerId::new("ur"),
                failures_left: AtomicU32::new(failures),
                runs: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl ControllerTask for Flaky {
        fn controller(&self) -> &ControllerId {
            &self.controller
        }

        async fn run(&self, ctx: CancellationToken) -> Result<(), SyncError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(SyncError::StreamEnded);
            }
            ctx.cancelled().await;
            Err(SyncError::Canceled)
        }
    }

    fn fast_backoff() -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(10),
            max: Duration::from_millis(50),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_retried_with_backoff() {
        let task = Flaky::new(3);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let actor = StreamActor::new(
            task.clone(),
            RestartPolicy::Always { interval: None },
            fast_backoff(),
            bus,
        );

        let token = CancellationToken::new();
        let handle = tokio::spawn(actor.run(token.clone()));

        // Let the three failures and their backoffs elapse.
        for _ in 0..16 {
            tokio::time::advance(Duration::from_millis(50)).await;
        }
        assert_eq!(task.runs.load(Ordering::SeqCst), 4);

        token.cancel();
        assert_eq!(handle.await.unwrap(), ActorExit::Canceled);

        let mut restarts = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::RestartScheduled {
                restarts += 1;
            }
        }
        assert_eq!(restarts, 3);
    }

    #[tokio::test]
    async fn test_never_policy_exits_after_one_failure() {
        let task = Flaky::new(10);
        let actor = StreamActor::new(
            task.clone(),
            RestartPolicy::Never,
            fast_backoff(),
            Bus::new(8),
        );
        let exit = actor.run(CancellationToken::new()).await;
        assert_eq!(exit, ActorExit::Exhausted);
        assert_eq!(task.runs.load(Ordering::SeqCst), 1);
    }

    /// Task completing successfully exactly once.
    struct OneShot(ControllerId);

    #[async_trait]
    impl ControllerTask for OneShot {
        fn controller(&self) -> &ControllerId {
            &self.0
        }

        async fn run(&self, _ctx: CancellationToken) -> Result<(), SyncError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_on_failure_policy_stops_after_success() {
        let actor = StreamActor::new(
            Arc::new(OneShot(ControllerId::new("ur"))),
            RestartPolicy::OnFailure,
            fast_backoff(),
            Bus::new(8),
        );
        assert_eq!(actor.run(CancellationToken::new()).await, ActorExit::Exhausted);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_never_runs_task() {
        let task = Flaky::new(0);
        let actor = StreamActor::new(
            task.clone(),
            RestartPolicy::Always { interval: None },
            fast_backoff(),
            Bus::new(8),
        );
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(actor.run(token).await, ActorExit::Canceled);
        assert_eq!(task.runs.load(Ordering::SeqCst), 0);
    }
}
