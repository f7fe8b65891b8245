//! The streaming task: one controller's state stream, mirrored into the
//! fleet-care surface.
//!
//! ## Flow
//! ```text
//! run(ctx):
//!   ├─► describe controller ──► register_device (factsheet, retained)
//!   ├─► connect_device (connection=online)
//!   ├─► open_state_stream
//!   └─► loop {
//!         select! {
//!           ctx cancelled ─► drop stream, disconnect_device, Err(Canceled)
//!           next entry:
//!             Ok(event)  ─► safety-state change? ─► publish_errors
//!             Err(e)     ─► Err(e)        (actor restarts with backoff)
//!             None       ─► Err(StreamEnded)
//!         }
//!       }
//! ```
//!
//! ## Rules
//! - Only a **change** of safety state is acted on; repeated entries with
//!   the same state are skipped.
//! - Entering an alarming state raises an active error (severity 4,
//!   component `robot_controller`); leaving it publishes an empty set to
//!   clear the condition.
//! - Mid-stream report failures are logged and skipped; the stream is
//!   worth more than one lost publication.
//! - Disconnect on cancellation is best effort: failures are logged,
//!   never fatal.

use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use async_trait::async_trait;

use crate::care::{DeviceErrors, DeviceFactsheet, ErrorReport, Reporter};
use crate::cell::{CellApi, ControllerId, ControllerInfo, SafetyState};
use crate::error::SyncError;
use crate::tasks::ControllerTask;

/// Streaming task for one controller.
///
/// Built by the supervisor for every controller entering the tracked set;
/// restarted by its actor whenever the stream fails or ends.
pub struct StateSync {
    controller: ControllerId,
    cell: Arc<dyn CellApi>,
    reporter: Arc<dyn Reporter>,
    deployment: Option<String>,
}

impl StateSync {
    /// Creates the streaming task for `controller`.
    pub fn new(
        controller: ControllerId,
        cell: Arc<dyn CellApi>,
        reporter: Arc<dyn Reporter>,
        deployment: Option<String>,
    ) -> Self {
        Self {
            controller,
            cell,
            reporter,
            deployment,
        }
    }

    fn factsheet(&self, info: &ControllerInfo) -> DeviceFactsheet {
        DeviceFactsheet {
            serial: info.id.as_str().to_string(),
            name: info.name.clone(),
            manufacturer: info.manufacturer.clone(),
            model: info.model.clone(),
            version: info.version.clone(),
            deployment: self.deployment.clone(),
        }
    }

    /// Builds the error set for a safety-state transition.
    ///
    /// Entering a reportable state raises one active error carrying the
    /// raw wire code; any other transition clears the set.
    fn errors_for(state: &SafetyState) -> DeviceErrors {
        if state.is_reportable() {
            DeviceErrors::now(vec![ErrorReport {
                title: "Robot Controller Safety State".to_string(),
                code: state.as_code().to_string(),
                description: "Safety state of the robot controller has changed.".to_string(),
                component: "robot_controller".to_string(),
                severity: 4,
            }])
        } else {
            DeviceErrors::clear()
        }
    }

    async fn report_transition(&self, previous: Option<&SafetyState>, current: &SafetyState) {
        // Nothing to clear when the stream opens in a healthy state.
        let was_reportable = previous.map(SafetyState::is_reportable).unwrap_or(false);
        if !current.is_reportable() && !was_reportable {
            return;
        }

        let errors = Self::errors_for(current);
        if let Err(e) = self
            .reporter
            .publish_errors(self.controller.as_str(), &errors)
            .await
        {
            tracing::warn!(
                controller = %self.controller,
                error = %e,
                "safety report lost; stream continues"
            );
        }
    }

    async fn disconnect_best_effort(&self) {
        if let Err(e) = self.reporter.disconnect_device(self.controller.as_str()).await {
            tracing::warn!(
                controller = %self.controller,
                error = %e,
                "device disconnect failed during release"
            );
        }
    }
}

#[async_trait]
impl ControllerTask for StateSync {
    fn controller(&self) -> &ControllerId {
        &self.controller
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), SyncError> {
        let info = self.cell.describe(&self.controller).await?;
        self.reporter
            .register_device(&self.factsheet(&info))
            .await
            .map_err(SyncError::Register)?;
        self.reporter
            .connect_device(self.controller.as_str())
            .await
            .map_err(SyncError::Register)?;

        let mut stream = self.cell.open_state_stream(&self.controller).await?;
        let mut previous: Option<SafetyState> = None;

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    drop(stream);
                    self.disconnect_best_effort().await;
                    return Err(SyncError::Canceled);
                }
                entry = stream.next() => match entry {
                    Some(Ok(event)) => {
                        if previous.as_ref() != Some(&event.safety_state) {
                            tracing::debug!(
                                controller = %self.controller,
                                from = previous.as_ref().map(SafetyState::as_code).unwrap_or("-"),
                                to = event.safety_state.as_code(),
                                "safety state changed"
                            );
                            self.report_transition(previous.as_ref(), &event.safety_state).await;
                            previous = Some(event.safety_state);
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(SyncError::StreamEnded),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::care::ConnectionStatus;
    use crate::cell::{StateEvent, StateStream};
    use crate::error::{CellError, ReportError};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Reporter recording every publication for assertions.
    #[derive(Default)]
    struct Recording {
        factsheets: Mutex<Vec<DeviceFactsheet>>,
        connections: Mutex<Vec<(String, ConnectionStatus)>>,
        errors: Mutex<Vec<DeviceErrors>>,
    }

    #[async_trait]
    impl Reporter for Recording {
        async fn register_device(&self, factsheet: &DeviceFactsheet) -> Result<(), ReportError> {
            self.factsheets.lock().unwrap().push(factsheet.clone());
            Ok(())
        }

        async fn connect_device(&self, serial: &str) -> Result<(), ReportError> {
            self.connections
                .lock()
                .unwrap()
                .push((serial.to_string(), ConnectionStatus::Online));
            Ok(())
        }

        async fn disconnect_device(&self, serial: &str) -> Result<(), ReportError> {
            self.connections
                .lock()
                .unwrap()
                .push((serial.to_string(), ConnectionStatus::Offline));
            Ok(())
        }

        async fn publish_errors(
            &self,
            _serial: &str,
            errors: &DeviceErrors,
        ) -> Result<(), ReportError> {
            self.errors.lock().unwrap().push(errors.clone());
            Ok(())
        }
    }

    /// Cell serving one controller with a scripted sequence of entries.
    struct ScriptedCell {
        id: ControllerId,
        entries: Mutex<VecDeque<Result<StateEvent, CellError>>>,
    }

    impl ScriptedCell {
        fn new(id: &str, states: Vec<SafetyState>) -> Self {
            let id = ControllerId::new(id);
            let entries = states
                .into_iter()
                .map(|s| Ok(StateEvent::now(id.clone(), s)))
                .collect();
            Self {
                id,
                entries: Mutex::new(entries),
            }
        }
    }

    #[async_trait]
    impl CellApi for ScriptedCell {
        async fn list_controllers(&self) -> Result<Vec<ControllerId>, CellError> {
            Ok(vec![self.id.clone()])
        }

        async fn describe(&self, controller: &ControllerId) -> Result<ControllerInfo, CellError> {
            Ok(ControllerInfo {
                id: controller.clone(),
                name: format!("Cell - {controller}"),
                manufacturer: "universal-robots".to_string(),
                model: "ur3e".to_string(),
                version: Some("1.0.0".to_string()),
            })
        }

        async fn open_state_stream(
            &self,
            _controller: &ControllerId,
        ) -> Result<StateStream, CellError> {
            let entries: Vec<_> = self.entries.lock().unwrap().drain(..).collect();
            Ok(Box::pin(futures::stream::iter(entries)))
        }
    }

    fn sync_over(states: Vec<SafetyState>) -> (StateSync, Arc<Recording>) {
        let cell = Arc::new(ScriptedCell::new("ur", states));
        let reporter = Arc::new(Recording::default());
        let task = StateSync::new(
            ControllerId::new("ur"),
            cell,
            reporter.clone(),
            Some("Default".to_string()),
        );
        (task, reporter)
    }

    #[tokio::test]
    async fn test_registers_and_connects_device() {
        let (task, reporter) = sync_over(vec![]);
        let res = task.run(CancellationToken::new()).await;
        assert!(matches!(res, Err(SyncError::StreamEnded)));

        let factsheets = reporter.factsheets.lock().unwrap();
        assert_eq!(factsheets.len(), 1);
        assert_eq!(factsheets[0].serial, "ur");
        assert_eq!(factsheets[0].deployment.as_deref(), Some("Default"));

        let connections = reporter.connections.lock().unwrap();
        assert_eq!(
            connections.as_slice(),
            &[("ur".to_string(), ConnectionStatus::Online)]
        );
    }

    #[tokio::test]
    async fn test_reports_only_on_state_change() {
        let (task, reporter) = sync_over(vec![
            SafetyState::Normal,
            SafetyState::Normal,
            SafetyState::EmergencyStop,
            SafetyState::EmergencyStop,
            SafetyState::Normal,
        ]);
        let _ = task.run(CancellationToken::new()).await;

        let errors = reporter.errors.lock().unwrap();
        // One raise (enter e-stop) and one clear (leave it); the healthy
        // opening state publishes nothing.
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].active_errors.len(), 1);
        assert_eq!(
            errors[0].active_errors[0].code,
            "SAFETY_STATE_ROBOT_EMERGENCY_STOP"
        );
        assert_eq!(errors[0].active_errors[0].severity, 4);
        assert!(errors[1].active_errors.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_disconnects_and_exits_cleanly() {
        // Pending-forever stream: cancel while waiting for entries.
        struct HangingCell(ControllerId);

        #[async_trait]
        impl CellApi for HangingCell {
            async fn list_controllers(&self) -> Result<Vec<ControllerId>, CellError> {
                Ok(vec![self.0.clone()])
            }

            async fn describe(
                &self,
                controller: &ControllerId,
            ) -> Result<ControllerInfo, CellError> {
                Ok(ControllerInfo {
                    id: controller.clone(),
                    name: "Cell - ur".to_string(),
                    manufacturer: "universal-robots".to_string(),
                    model: "ur3e".to_string(),
                    version: None,
                })
            }

            async fn open_state_stream(
                &self,
                _controller: &ControllerId,
            ) -> Result<StateStream, CellError> {
                Ok(Box::pin(futures::stream::pending()))
            }
        }

        let reporter = Arc::new(Recording::default());
        let task = StateSync::new(
            ControllerId::new("ur"),
            Arc::new(HangingCell(ControllerId::new("ur"))),
            reporter.clone(),
            None,
        );

        let ctx = CancellationToken::new();
        let handle = {
            let ctx = ctx.clone();
            tokio::spawn(async move { task.run(ctx).await })
        };
        tokio::task::yield_now().await;
        ctx.cancel();

        let res = handle.await.unwrap();
        assert!(matches!(res, Err(SyncError::Canceled)));

        let connections = reporter.connections.lock().unwrap();
        assert_eq!(
            connections.last(),
            Some(&("ur".to_string(), ConnectionStatus::Offline))
        );
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let cell = Arc::new(ScriptedCell::new("ur", vec![]));
        cell.entries
            .lock()
            .unwrap()
            .push_back(Err(CellError::StreamInterrupted {
                reason: "link down".to_string(),
            }));
        let task = StateSync::new(
            ControllerId::new("ur"),
            cell,
            Arc::new(Recording::default()),
            None,
        );
        let res = task.run(CancellationToken::new()).await;
        assert!(matches!(res, Err(SyncError::Cell(_))));
    }
}
