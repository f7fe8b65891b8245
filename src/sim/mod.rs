//! In-memory cell for demos and integration tests.
//!
//! [`SimCell`] implements [`CellApi`] over a mutable controller set with
//! scripted state streams, standing in for an SDK-backed cell the same
//! way a virtual controller stands in for hardware:
//!
//! - controllers appear/disappear at runtime
//!   ([`SimCell::add_controller`], [`SimCell::remove_controller`])
//! - safety states are driven from the outside
//!   ([`SimHandle::set_safety_state`])
//! - stream and discovery failures are injected on demand
//!   ([`SimHandle::fail_stream`], [`SimCell::set_discovery_error`])
//!
//! The cell also counts opened and currently active streams per
//! controller, which lets tests assert that a kept controller's stream
//! was never reopened and that removal released it.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;

use crate::cell::{CellApi, ControllerId, ControllerInfo, SafetyState, StateEvent, StateStream};
use crate::error::CellError;

type Entry = Result<StateEvent, CellError>;

struct SimController {
    info: ControllerInfo,
    subscribers: Vec<mpsc::UnboundedSender<Entry>>,
    last_state: SafetyState,
    opened: Arc<AtomicU64>,
    active: Arc<AtomicUsize>,
}

#[derive(Default)]
struct SimState {
    controllers: BTreeMap<ControllerId, SimController>,
    discovery_error: Option<String>,
}

/// Simulated cell with a mutable controller set and scripted streams.
#[derive(Clone, Default)]
pub struct SimCell {
    state: Arc<Mutex<SimState>>,
}

impl SimCell {
    /// Creates an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a controller; its streams open in [`SafetyState::Normal`].
    ///
    /// Returns a handle for driving the controller from the outside.
    pub fn add_controller(&self, id: impl Into<ControllerId>) -> SimHandle {
        let id = id.into();
        let mut state = self.state.lock().expect("sim state poisoned");
        state.controllers.insert(
            id.clone(),
            SimController {
                info: ControllerInfo {
                    id: id.clone(),
                    name: format!("Sim - {id}"),
                    manufacturer: "universal-robots".to_string(),
                    model: "ur3e".to_string(),
                    version: Some("1.0.0".to_string()),
                },
                subscribers: Vec::new(),
                last_state: SafetyState::Normal,
                opened: Arc::new(AtomicU64::new(0)),
                active: Arc::new(AtomicUsize::new(0)),
            },
        );
        SimHandle {
            id,
            cell: self.clone(),
        }
    }

    /// Removes a controller; open streams on it end.
    pub fn remove_controller(&self, id: &ControllerId) {
        let mut state = self.state.lock().expect("sim state poisoned");
        state.controllers.remove(id);
    }

    /// Makes subsequent discovery polls fail (or succeed again with
    /// `None`).
    pub fn set_discovery_error(&self, reason: Option<&str>) {
        let mut state = self.state.lock().expect("sim state poisoned");
        state.discovery_error = reason.map(str::to_string);
    }

    /// Number of streams ever opened for one controller.
    pub fn opened_streams(&self, id: &ControllerId) -> u64 {
        let state = self.state.lock().expect("sim state poisoned");
        state
            .controllers
            .get(id)
            .map(|c| c.opened.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Number of currently open (not yet dropped) streams for one
    /// controller.
    pub fn active_streams(&self, id: &ControllerId) -> usize {
        let state = self.state.lock().expect("sim state poisoned");
        state
            .controllers
            .get(id)
            .map(|c| c.active.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

#[async_trait]
impl CellApi for SimCell {
    async fn list_controllers(&self) -> Result<Vec<ControllerId>, CellError> {
        let state = self.state.lock().expect("sim state poisoned");
        if let Some(reason) = &state.discovery_error {
            return Err(CellError::Unavailable {
                reason: reason.clone(),
            });
        }
        Ok(state.controllers.keys().cloned().collect())
    }

    async fn describe(&self, controller: &ControllerId) -> Result<ControllerInfo, CellError> {
        let state = self.state.lock().expect("sim state poisoned");
        state
            .controllers
            .get(controller)
            .map(|c| c.info.clone())
            .ok_or_else(|| CellError::UnknownController {
                controller: controller.clone(),
            })
    }

    async fn open_state_stream(
        &self,
        controller: &ControllerId,
    ) -> Result<StateStream, CellError> {
        let mut state = self.state.lock().expect("sim state poisoned");
        let sim = state
            .controllers
            .get_mut(controller)
            .ok_or_else(|| CellError::UnknownController {
                controller: controller.clone(),
            })?;

        let (tx, rx) = mpsc::unbounded_channel();
        // A fresh stream starts with the current state, like a retained
        // status read-back.
        let _ = tx.send(Ok(StateEvent::now(
            controller.clone(),
            sim.last_state.clone(),
        )));
        sim.subscribers.push(tx);
        sim.opened.fetch_add(1, Ordering::SeqCst);
        sim.active.fetch_add(1, Ordering::SeqCst);

        Ok(Box::pin(SimStream {
            rx,
            _guard: ActiveGuard(Arc::clone(&sim.active)),
        }))
    }
}

/// Handle for driving one simulated controller.
#[derive(Clone)]
pub struct SimHandle {
    id: ControllerId,
    cell: SimCell,
}

impl SimHandle {
    /// The controller's identifier.
    pub fn id(&self) -> &ControllerId {
        &self.id
    }

    /// Sets the safety state and pushes it to every open stream.
    pub fn set_safety_state(&self, safety_state: SafetyState) {
        let mut state = self.cell.state.lock().expect("sim state poisoned");
        if let Some(sim) = state.controllers.get_mut(&self.id) {
            sim.last_state = safety_state.clone();
            let event = StateEvent::now(self.id.clone(), safety_state);
            sim.subscribers
                .retain(|tx| tx.send(Ok(event.clone())).is_ok());
        }
    }

    /// Pushes a stream error to every open stream and detaches them; the
    /// next open starts clean.
    pub fn fail_stream(&self, reason: &str) {
        let mut state = self.cell.state.lock().expect("sim state poisoned");
        if let Some(sim) = state.controllers.get_mut(&self.id) {
            for tx in sim.subscribers.drain(..) {
                let _ = tx.send(Err(CellError::StreamInterrupted {
                    reason: reason.to_string(),
                }));
            }
        }
    }
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct SimStream {
    rx: mpsc::UnboundedReceiver<Entry>,
    _guard: ActiveGuard,
}

impl Stream for SimStream {
    type Item = Entry;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_stream_serves_current_state_first() {
        let cell = SimCell::new();
        let handle = cell.add_controller("ur");
        handle.set_safety_state(SafetyState::EmergencyStop);

        let mut stream = cell.open_state_stream(handle.id()).await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.safety_state, SafetyState::EmergencyStop);
    }

    #[tokio::test]
    async fn test_fail_stream_delivers_error_then_closes() {
        let cell = SimCell::new();
        let handle = cell.add_controller("ur");

        let mut stream = cell.open_state_stream(handle.id()).await.unwrap();
        let _ = stream.next().await; // opening state
        handle.fail_stream("link down");

        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_counters() {
        let cell = SimCell::new();
        let handle = cell.add_controller("ur");
        let id = handle.id().clone();

        let stream = cell.open_state_stream(&id).await.unwrap();
        assert_eq!(cell.opened_streams(&id), 1);
        assert_eq!(cell.active_streams(&id), 1);

        drop(stream);
        assert_eq!(cell.active_streams(&id), 0);
        assert_eq!(cell.opened_streams(&id), 1);
    }

    #[tokio::test]
    async fn test_removed_controller_ends_streams() {
        let cell = SimCell::new();
        let handle = cell.add_controller("ur");
        let id = handle.id().clone();

        let mut stream = cell.open_state_stream(&id).await.unwrap();
        let _ = stream.next().await;
        cell.remove_controller(&id);

        assert!(stream.next().await.is_none());
        assert!(cell.list_controllers().await.unwrap().is_empty());
    }
}
