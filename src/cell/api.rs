//! The async surface consumed from the cell.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::cell::{ControllerId, StateEvent};
use crate::error::CellError;

/// A continuous stream of state entries for one controller.
///
/// The stream is expected to run until cancelled; both an `Err` item and a
/// clean end (`None`) count as termination and lead to a restart of the
/// consuming task.
pub type StateStream = Pin<Box<dyn Stream<Item = Result<StateEvent, CellError>> + Send>>;

/// Static description of one controller, used to register the device on
/// the fleet-care surface.
#[derive(Clone, Debug)]
pub struct ControllerInfo {
    /// Controller identifier (also the device serial).
    pub id: ControllerId,
    /// Human-readable name.
    pub name: String,
    /// Manufacturer slug.
    pub manufacturer: String,
    /// Model slug.
    pub model: String,
    /// Firmware/model version, when the cell reports one.
    pub version: Option<String>,
}

/// The surface the runtime consumes from the external cell.
///
/// Implementations wrap the vendor SDK client. All methods are expected to
/// be cancel-safe; the runtime may drop a pending call during shutdown.
///
/// # Example
/// ```no_run
/// use async_trait::async_trait;
/// use cellvisor::{CellApi, CellError, ControllerId, ControllerInfo, StateStream};
///
/// struct SdkCell;
///
/// #[async_trait]
/// impl CellApi for SdkCell {
///     async fn list_controllers(&self) -> Result<Vec<ControllerId>, CellError> {
///         // call the SDK here
///         Ok(vec![ControllerId::new("ur")])
///     }
///
///     async fn describe(&self, controller: &ControllerId) -> Result<ControllerInfo, CellError> {
///         # let _ = controller; unimplemented!()
///     }
///
///     async fn open_state_stream(&self, controller: &ControllerId) -> Result<StateStream, CellError> {
///         # let _ = controller; unimplemented!()
///     }
/// }
/// ```
#[async_trait]
pub trait CellApi: Send + Sync + 'static {
    /// Lists the controllers currently available in the cell.
    ///
    /// The result is the authoritative desired set for reconciliation.
    /// Errors are logged and retried on the next poll cycle, never fatal.
    async fn list_controllers(&self) -> Result<Vec<ControllerId>, CellError>;

    /// Returns the static description of one controller.
    async fn describe(&self, controller: &ControllerId) -> Result<ControllerInfo, CellError>;

    /// Opens a state stream for one controller.
    ///
    /// Dropping the returned stream releases the underlying handle.
    async fn open_state_stream(&self, controller: &ControllerId)
        -> Result<StateStream, CellError>;
}
