//! Topic layout of the fleet-care `v1` API.
//!
//! ```text
//! v1/{connection}                                    gateway connection
//! v1/{connection}/{customer}/{serial}/factsheet      device identity
//! v1/{connection}/{customer}/{serial}/connection     device online/offline
//! v1/{connection}/{customer}/{serial}/errors         active error set
//! ```
//!
//! Identity channels (gateway, factsheet, connection) are retained and
//! delivered at least once; the error channel is fire-and-forget.

/// Protocol version prefix of every topic.
pub const VERSION: &str = "v1";

/// Delivery class of one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QosClass {
    /// Fire-and-forget.
    AtMostOnce,
    /// Delivered at least once.
    AtLeastOnce,
}

/// A fully resolved topic with its delivery semantics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicSpec {
    /// Full topic path.
    pub topic: String,
    /// Whether the broker keeps the last payload for late subscribers.
    pub retain: bool,
    /// Delivery class.
    pub qos: QosClass,
}

impl TopicSpec {
    /// Gateway connection topic: `v1/{connection}`.
    pub fn gateway(connection: &str) -> Self {
        Self {
            topic: format!("{VERSION}/{connection}"),
            retain: true,
            qos: QosClass::AtLeastOnce,
        }
    }

    /// Device factsheet topic.
    pub fn factsheet(connection: &str, customer: &str, serial: &str) -> Self {
        Self {
            topic: format!("{VERSION}/{connection}/{customer}/{serial}/factsheet"),
            retain: true,
            qos: QosClass::AtLeastOnce,
        }
    }

    /// Device connection topic.
    pub fn connection(connection: &str, customer: &str, serial: &str) -> Self {
        Self {
            topic: format!("{VERSION}/{connection}/{customer}/{serial}/connection"),
            retain: true,
            qos: QosClass::AtLeastOnce,
        }
    }

    /// Device errors topic.
    pub fn errors(connection: &str, customer: &str, serial: &str) -> Self {
        Self {
            topic: format!("{VERSION}/{connection}/{customer}/{serial}/errors"),
            retain: false,
            qos: QosClass::AtMostOnce,
        }
    }
}
