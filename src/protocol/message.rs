//! Wire message types for the control channel.
//!
//! Every frame on the control socket is a text message.
//!
//! | Message | Direction | Format |
//! |---------|-----------|--------|
//! | [`OutboundMessage`] | Client → Broker | `{"topic": "...", "payload": "..."}` |
//! | [`SubscriptionFrame`] | Client → Broker | `{"action": "subscribe", "topic": "..."}` |
//! | [`InboundMessage`] | Broker → Client | `{"topic": "...", "payload": ...}` or `topic:payload` |
//!
//! Inbound parsing never fails: text that is not a JSON envelope is split on
//! the first `:` into topic and payload, and text without a colon is kept
//! whole as the payload of an empty topic.

// ============================================================================
// Imports
// ============================================================================

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Topic segment marking an acknowledgment.
pub const ACK_MARKER: &str = "/ack";

/// Topic segment marking a status update.
pub const STATUS_MARKER: &str = "/status/";

// ============================================================================
// OutboundMessage
// ============================================================================

/// A message published by the client.
///
/// Created by every publish call and held in the pending queue until the
/// link is connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination topic.
    pub topic: String,
    /// Text payload.
    pub payload: String,
    /// When the message was created.
    pub enqueued_at: Instant,
}

/// Borrowed wire form of an outbound message.
#[derive(Serialize)]
struct WireOut<'a> {
    topic: &'a str,
    payload: &'a str,
}

impl OutboundMessage {
    /// Creates a message stamped with the current time.
    #[inline]
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            enqueued_at: Instant::now(),
        }
    }

    /// Serializes the message as a wire envelope.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(&WireOut {
            topic: &self.topic,
            payload: &self.payload,
        })?)
    }
}

// ============================================================================
// SubscriptionFrame
// ============================================================================

/// Subscription control verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionAction {
    /// Start receiving a topic.
    Subscribe,
    /// Stop receiving a topic.
    Unsubscribe,
}

/// A subscribe or unsubscribe control frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFrame {
    /// Subscribe or unsubscribe.
    pub action: SubscriptionAction,
    /// Topic concerned.
    pub topic: String,
}

impl SubscriptionFrame {
    /// Creates a subscribe frame.
    #[inline]
    #[must_use]
    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self {
            action: SubscriptionAction::Subscribe,
            topic: topic.into(),
        }
    }

    /// Creates an unsubscribe frame.
    #[inline]
    #[must_use]
    pub fn unsubscribe(topic: impl Into<String>) -> Self {
        Self {
            action: SubscriptionAction::Unsubscribe,
            topic: topic.into(),
        }
    }

    /// Serializes the frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// InboundMessage
// ============================================================================

/// JSON envelope sent by the broker.
#[derive(Deserialize)]
struct WireIn {
    topic: String,
    #[serde(default)]
    payload: Value,
}

/// A message received from the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Topic the message arrived on.
    pub topic: String,
    /// Payload as text.
    pub payload: String,
    /// When the message was received.
    pub received_at: Instant,
}

impl InboundMessage {
    /// Creates a message stamped with the current time.
    #[inline]
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Instant::now(),
        }
    }

    /// Parses a raw text frame.
    ///
    /// Tries the JSON envelope first, then `topic:payload`. A string payload
    /// is taken as-is, any other JSON payload is re-serialized, and a missing
    /// payload becomes empty.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if let Ok(wire) = serde_json::from_str::<WireIn>(text) {
            let payload = match wire.payload {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            return Self::new(wire.topic, payload);
        }

        match text.split_once(':') {
            Some((topic, payload)) => Self::new(topic, payload),
            None => Self::new(String::new(), text),
        }
    }

    /// Returns `true` if the topic carries the acknowledgment marker.
    #[inline]
    #[must_use]
    pub fn is_ack(&self) -> bool {
        self.topic.contains(ACK_MARKER)
    }

    /// Returns `true` if the topic carries the status marker.
    #[inline]
    #[must_use]
    pub fn is_status(&self) -> bool {
        self.topic.contains(STATUS_MARKER)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_outbound_wire_format() {
        let message = OutboundMessage::new("forklift/control", r#"{"id":"cam","command":"stop"}"#);
        let wire: Value = serde_json::from_str(&message.to_wire().expect("wire")).expect("json");

        assert_eq!(
            wire,
            json!({
                "topic": "forklift/control",
                "payload": "{\"id\":\"cam\",\"command\":\"stop\"}"
            })
        );
    }

    #[test]
    fn test_subscription_frames() {
        let sub = SubscriptionFrame::subscribe("forklift/status/+");
        let wire: Value = serde_json::from_str(&sub.to_wire().expect("wire")).expect("json");
        assert_eq!(wire, json!({ "action": "subscribe", "topic": "forklift/status/+" }));

        let unsub = SubscriptionFrame::unsubscribe("forklift/status/+");
        assert!(unsub.to_wire().expect("wire").contains("\"unsubscribe\""));
    }

    #[test]
    fn test_parse_json_envelope() {
        let message = InboundMessage::parse(r#"{"topic":"forklift/control/cam/ack","payload":"ok"}"#);
        assert_eq!(message.topic, "forklift/control/cam/ack");
        assert_eq!(message.payload, "ok");
        assert!(message.is_ack());
        assert!(!message.is_status());
    }

    #[test]
    fn test_parse_structured_payload() {
        let message =
            InboundMessage::parse(r#"{"topic":"forklift/status/cam","payload":{"zoom":1.5}}"#);
        assert_eq!(message.topic, "forklift/status/cam");
        assert_eq!(message.payload, r#"{"zoom":1.5}"#);
        assert!(message.is_status());
    }

    #[test]
    fn test_parse_missing_payload() {
        let message = InboundMessage::parse(r#"{"topic":"forklift/heartbeat"}"#);
        assert_eq!(message.topic, "forklift/heartbeat");
        assert_eq!(message.payload, "");
    }

    #[test]
    fn test_parse_colon_fallback() {
        let message = InboundMessage::parse("forklift/control/ack:tilt_up:done");
        assert_eq!(message.topic, "forklift/control/ack");
        assert_eq!(message.payload, "tilt_up:done");
    }

    #[test]
    fn test_parse_json_without_topic_falls_back() {
        let message = InboundMessage::parse(r#"{"payload":"orphan"}"#);
        assert_eq!(message.topic, "{\"payload\"");
        assert_eq!(message.payload, "\"orphan\"}");
    }

    #[test]
    fn test_parse_plain_text() {
        let message = InboundMessage::parse("hello");
        assert_eq!(message.topic, "");
        assert_eq!(message.payload, "hello");
    }
}
