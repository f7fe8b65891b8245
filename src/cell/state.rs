//! Controller safety states and state-stream entries.

use chrono::{DateTime, Utc};

use crate::cell::ControllerId;

/// Safety state of one controller, decoded from the cell's wire codes.
///
/// Unrecognized codes are preserved verbatim in [`SafetyState::Unknown`]
/// so that reports keep the original value instead of guessing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SafetyState {
    /// Normal operation.
    Normal,
    /// Reduced-speed mode.
    Reduced,
    /// Protective stop engaged.
    ProtectiveStop,
    /// Robot emergency stop engaged. The only state reported to the
    /// fleet-care surface.
    EmergencyStop,
    /// A code this crate does not classify.
    Unknown(String),
}

impl SafetyState {
    /// Decodes a wire code as emitted by the cell.
    pub fn from_code(code: &str) -> Self {
        match code {
            "SAFETY_STATE_NORMAL" => SafetyState::Normal,
            "SAFETY_STATE_REDUCED" => SafetyState::Reduced,
            "SAFETY_STATE_PROTECTIVE_STOP" => SafetyState::ProtectiveStop,
            "SAFETY_STATE_ROBOT_EMERGENCY_STOP" => SafetyState::EmergencyStop,
            other => SafetyState::Unknown(other.to_string()),
        }
    }

    /// Returns the wire code for this state.
    pub fn as_code(&self) -> &str {
        match self {
            SafetyState::Normal => "SAFETY_STATE_NORMAL",
            SafetyState::Reduced => "SAFETY_STATE_REDUCED",
            SafetyState::ProtectiveStop => "SAFETY_STATE_PROTECTIVE_STOP",
            SafetyState::EmergencyStop => "SAFETY_STATE_ROBOT_EMERGENCY_STOP",
            SafetyState::Unknown(code) => code,
        }
    }

    /// True for states that raise an active error on the fleet-care
    /// surface.
    pub fn is_reportable(&self) -> bool {
        matches!(self, SafetyState::EmergencyStop)
    }
}

/// One entry of a controller state stream.
#[derive(Clone, Debug)]
pub struct StateEvent {
    /// The controller this entry belongs to.
    pub controller: ControllerId,
    /// Safety state carried by the entry.
    pub safety_state: SafetyState,
    /// Cell-side timestamp of the entry.
    pub at: DateTime<Utc>,
}

impl StateEvent {
    /// Creates an entry stamped with the current time.
    pub fn now(controller: ControllerId, safety_state: SafetyState) -> Self {
        Self {
            controller,
            safety_state,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in [
            "SAFETY_STATE_NORMAL",
            "SAFETY_STATE_REDUCED",
            "SAFETY_STATE_PROTECTIVE_STOP",
            "SAFETY_STATE_ROBOT_EMERGENCY_STOP",
        ] {
            assert_eq!(SafetyState::from_code(code).as_code(), code);
        }
    }

    #[test]
    fn test_unknown_code_preserved() {
        let state = SafetyState::from_code("SAFETY_STATE_DEVICE_EMERGENCY_STOP");
        assert_eq!(state.as_code(), "SAFETY_STATE_DEVICE_EMERGENCY_STOP");
        assert!(!state.is_reportable());
    }

    #[test]
    fn test_only_emergency_stop_is_reportable() {
        assert!(SafetyState::EmergencyStop.is_reportable());
        assert!(!SafetyState::Normal.is_reportable());
        assert!(!SafetyState::Reduced.is_reportable());
        assert!(!SafetyState::ProtectiveStop.is_reportable());
    }
}
