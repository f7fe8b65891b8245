//! Device payloads of the fleet-care `v1` API.
//!
//! Field names and enum forms follow the published JSON schemas; the
//! serde attributes below are load-bearing for wire compatibility
//! (`activeErrors` is camelCase, status enums are lowercase).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Returns the current UTC time, the timestamp base for all payloads.
///
/// Payload timestamps serialize as ISO-8601 with seconds precision and a
/// trailing `Z`, e.g. `1991-03-11T11:40:03Z`.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now()
}

fn serialize_timestamp<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Connection status of the gateway or of one device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Connected and reporting.
    Online,
    /// Disconnected; retained as the last known state.
    Offline,
}

/// Payload of the `connection` channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connection {
    /// Online/offline marker.
    pub status: ConnectionStatus,
    /// When the status changed.
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Connection {
    /// Creates a status payload stamped with the current time.
    pub fn now(status: ConnectionStatus) -> Self {
        Self {
            status,
            timestamp: timestamp_now(),
        }
    }
}

/// Payload of the `factsheet` channel: static identity of one device.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceFactsheet {
    /// Device identification.
    pub serial: String,
    /// Device name.
    pub name: String,
    /// Manufacturer slug.
    pub manufacturer: String,
    /// Model slug.
    pub model: String,
    /// Model version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Deployment name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
}

/// One active error entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Short error title.
    pub title: String,
    /// Stable error code; for safety reports this is the raw safety-state
    /// wire code.
    pub code: String,
    /// Human-readable description.
    pub description: String,
    /// Component the error originates from.
    pub component: String,
    /// Severity, 1 (info) to 4 (critical).
    pub severity: u8,
}

/// Payload of the `errors` channel: the full set of currently active
/// errors. Publishing an empty set clears the condition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceErrors {
    /// When the set was computed.
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Active errors; empty means all clear.
    #[serde(rename = "activeErrors")]
    pub active_errors: Vec<ErrorReport>,
}

impl DeviceErrors {
    /// Creates an error set stamped with the current time.
    pub fn now(active_errors: Vec<ErrorReport>) -> Self {
        Self {
            timestamp: timestamp_now(),
            active_errors,
        }
    }

    /// Creates an empty (all clear) error set.
    pub fn clear() -> Self {
        Self::now(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_status_serializes_lowercase() {
        let payload = serde_json::to_value(Connection::now(ConnectionStatus::Online)).unwrap();
        assert_eq!(payload["status"], "online");
        let payload = serde_json::to_value(Connection::now(ConnectionStatus::Offline)).unwrap();
        assert_eq!(payload["status"], "offline");
    }

    #[test]
    fn test_timestamp_format() {
        let payload = serde_json::to_value(Connection::now(ConnectionStatus::Online)).unwrap();
        let ts = payload["timestamp"].as_str().unwrap();
        assert!(ts.ends_with('Z'), "timestamp {ts} must be zulu");
        assert_eq!(ts.len(), "1991-03-11T11:40:03Z".len());
    }

    #[test]
    fn test_active_errors_field_is_camel_case() {
        let errors = DeviceErrors::now(vec![ErrorReport {
            title: "Robot Controller Safety State".into(),
            code: "SAFETY_STATE_ROBOT_EMERGENCY_STOP".into(),
            description: "Safety state of the robot controller has changed.".into(),
            component: "robot_controller".into(),
            severity: 4,
        }]);
        let payload = serde_json::to_value(&errors).unwrap();
        assert!(payload.get("activeErrors").is_some());
        assert!(payload.get("active_errors").is_none());
        assert_eq!(payload["activeErrors"][0]["severity"], 4);
    }

    #[test]
    fn test_factsheet_omits_absent_optionals() {
        let factsheet = DeviceFactsheet {
            serial: "ur".into(),
            name: "Cell - ur".into(),
            manufacturer: "universal-robots".into(),
            model: "ur3e".into(),
            version: None,
            deployment: None,
        };
        let payload = serde_json::to_value(&factsheet).unwrap();
        assert!(payload.get("version").is_none());
        assert!(payload.get("deployment").is_none());
    }
}
