//! Control command definitions.
//!
//! A [`ControlCommand`] is what the dispatcher produces and the link
//! publishes on [`CONTROL_TOPIC`].
//!
//! # Format
//!
//! ```json
//! { "id": "local_camera_right", "command": "tilt_up", "value": 75.0 }
//! ```
//!
//! `value` is omitted when the command carries no level.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identifiers::CameraId;

use super::Action;

// ============================================================================
// Constants
// ============================================================================

/// Topic carrying control payloads to the rig.
pub const CONTROL_TOPIC: &str = "forklift/control";

/// Topic used to ask every camera for its status.
pub const STATUS_REQUEST_TOPIC: &str = "forklift/control/status/request";

/// Payload of a status request meaning "all cameras".
pub const STATUS_REQUEST_ALL: &str = "all";

/// Topic used to recall a named camera preset.
pub const PRESET_TOPIC: &str = "forklift/control/preset";

// ============================================================================
// ControlCommand
// ============================================================================

/// An actuation command for one camera.
///
/// Immutable once built. Sending the same command twice has the same
/// effect as holding the gesture longer, so replays are harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlCommand {
    /// Target camera.
    #[serde(rename = "id")]
    target_id: CameraId,

    /// Action to perform.
    #[serde(rename = "command")]
    action: Action,

    /// Optional slider level in `0..=100`, sent as an integer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<u8>,
}

impl ControlCommand {
    /// Creates a command without a value.
    #[inline]
    #[must_use]
    pub fn new(action: Action, target_id: CameraId) -> Self {
        Self {
            target_id,
            action,
            value: None,
        }
    }

    /// Creates a command carrying a level.
    #[inline]
    #[must_use]
    pub fn with_value(action: Action, target_id: CameraId, value: u8) -> Self {
        Self {
            target_id,
            action,
            value: Some(value),
        }
    }

    /// Creates a `stop` command for the given camera.
    #[inline]
    #[must_use]
    pub fn stop(target_id: CameraId) -> Self {
        Self::new(Action::Stop, target_id)
    }

    /// Returns the action.
    #[inline]
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns the target camera.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> &CameraId {
        &self.target_id
    }

    /// Returns the level, if any.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<u8> {
        self.value
    }

    /// Serializes the command as the JSON text published on [`CONTROL_TOPIC`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "{}@{}={}", self.action, self.target_id, value),
            None => write!(f, "{}@{}", self.action, self.target_id),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    #[test]
    fn test_payload_without_value() {
        let command = ControlCommand::new(Action::MoveUp, CameraId::default());
        let payload: Value =
            serde_json::from_str(&command.to_payload().expect("payload")).expect("json");

        assert_eq!(
            payload,
            json!({ "id": "local_camera_right", "command": "move/up" })
        );
    }

    #[test]
    fn test_payload_with_value() {
        let command = ControlCommand::with_value(Action::ZoomIn, "cam-2".into(), 75);
        let payload: Value =
            serde_json::from_str(&command.to_payload().expect("payload")).expect("json");

        assert_eq!(payload["id"], "cam-2");
        assert_eq!(payload["command"], "zoom_in");
        assert_eq!(payload["value"].as_u64(), Some(75));
    }

    #[test]
    fn test_value_is_an_integer_on_the_wire() {
        let command = ControlCommand::with_value(Action::TiltUp, CameraId::default(), 80);
        let payload = command.to_payload().expect("payload");

        assert!(payload.contains(r#""value":80"#), "{payload}");
        assert!(!payload.contains("80.0"), "{payload}");
    }

    #[test]
    fn test_payload_parses_back() {
        let json_str = r#"{"id":"local_camera_right","command":"tilt_down","value":20}"#;
        let command: ControlCommand = serde_json::from_str(json_str).expect("parse");

        assert_eq!(command.action(), Action::TiltDown);
        assert_eq!(command.value(), Some(20));
    }

    #[test]
    fn test_stop_command() {
        let command = ControlCommand::stop(CameraId::default());
        assert_eq!(command.action(), Action::Stop);
        assert_eq!(command.value(), None);
        assert_eq!(command.to_string(), "stop@local_camera_right");
    }
}
