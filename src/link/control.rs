//! Camera control helpers.
//!
//! Thin wrappers publishing on the fixed control topics.
//!
//! | Method | Topic | Payload |
//! |--------|-------|---------|
//! | `send_control` | `forklift/control` | `{"id": ..., "command": ..., "value": ...}` |
//! | `request_camera_status` | `forklift/control/status/request` | `all` |
//! | `set_camera_preset` | `forklift/control/preset` | preset name |

// ============================================================================
// Imports
// ============================================================================

use tracing::{trace, warn};

use crate::dispatcher::CommandSink;
use crate::error::{Error, Result};
use crate::protocol::{
    CONTROL_TOPIC, ControlCommand, PRESET_TOPIC, STATUS_REQUEST_ALL, STATUS_REQUEST_TOPIC,
};

use super::manager::ConnectionManager;

// ============================================================================
// Camera Control
// ============================================================================

impl ConnectionManager {
    /// Publishes a control command.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if the command cannot be serialized.
    pub fn send_control(&self, command: &ControlCommand) -> Result<()> {
        let payload = command.to_payload()?;
        trace!(%command, "Control command");
        self.publish(CONTROL_TOPIC, payload);
        Ok(())
    }

    /// Asks every camera to report its status.
    pub fn request_camera_status(&self) {
        self.publish(STATUS_REQUEST_TOPIC, STATUS_REQUEST_ALL);
    }

    /// Moves the rig to a named preset.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `preset` is empty.
    pub fn set_camera_preset(&self, preset: &str) -> Result<()> {
        if preset.is_empty() {
            return Err(Error::invalid_argument("preset must not be empty"));
        }
        self.publish(PRESET_TOPIC, preset);
        Ok(())
    }
}

impl CommandSink for ConnectionManager {
    fn send_command(&self, command: &ControlCommand) {
        if let Err(e) = self.send_control(command) {
            warn!(%command, error = %e, "Control command dropped");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use serde_json::{Value, json};

    use crate::identifiers::CameraId;
    use crate::protocol::Action;
    use crate::test_support::TestBroker;

    fn envelope(wire: &str) -> (String, String) {
        let value: Value = serde_json::from_str(wire).expect("json");
        (
            value["topic"].as_str().expect("topic").to_string(),
            value["payload"].as_str().expect("payload").to_string(),
        )
    }

    #[tokio::test]
    async fn test_control_helpers_publish_on_fixed_topics() {
        let mut broker = TestBroker::start().await;
        let link = ConnectionManager::builder()
            .url(broker.url().as_str())
            .build()
            .expect("build");

        link.send_control(&ControlCommand::with_value(
            Action::ZoomIn,
            CameraId::default(),
            75,
        ))
        .expect("send");
        link.request_camera_status();
        link.set_camera_preset("home").expect("preset");
        link.send_command(&ControlCommand::stop(CameraId::default()));

        link.connect().expect("connect");
        link.wait_connected(Duration::from_secs(5)).await.expect("connected");

        let (topic, payload) = envelope(&broker.recv().await);
        assert_eq!(topic, "forklift/control");
        let payload: Value = serde_json::from_str(&payload).expect("payload json");
        assert_eq!(
            payload,
            json!({ "id": "local_camera_right", "command": "zoom_in", "value": 75 })
        );

        assert_eq!(
            envelope(&broker.recv().await),
            ("forklift/control/status/request".to_string(), "all".to_string())
        );
        assert_eq!(
            envelope(&broker.recv().await),
            ("forklift/control/preset".to_string(), "home".to_string())
        );

        let (topic, payload) = envelope(&broker.recv().await);
        assert_eq!(topic, "forklift/control");
        assert!(payload.contains("\"stop\""));
    }

    #[tokio::test]
    async fn test_empty_preset_rejected() {
        let link = ConnectionManager::builder()
            .url("ws://127.0.0.1:9")
            .build()
            .expect("build");
        assert!(link.set_camera_preset("").is_err());
        assert_eq!(link.pending_len(), 0);
    }
}
