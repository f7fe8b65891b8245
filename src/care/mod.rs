//! Fleet-care reporting surface.
//!
//! Controllers are mirrored into a fleet-care service as devices: each one
//! is registered with a factsheet, marked online/offline on its
//! `connection` channel, and raises active errors when its safety state
//! degrades.
//!
//! The broker transport itself is an external collaborator; this module
//! models the data (`v1` device schemas), the topic layout with its
//! retain/QoS classes, and the [`Reporter`] seam the streaming tasks
//! publish through. A broker-backed reporter plugs in from outside the
//! crate without touching the runtime.

mod reporter;
mod schema;
mod topic;

pub use reporter::{NoopReporter, Reporter};
pub use schema::{
    timestamp_now, Connection, ConnectionStatus, DeviceErrors, DeviceFactsheet, ErrorReport,
};
pub use topic::{QosClass, TopicSpec};

#[cfg(feature = "logging")]
pub use reporter::LogReporter;
