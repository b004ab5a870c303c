//! Control channel protocol types.
//!
//! This module defines what travels over the control socket: the action
//! vocabulary, control commands and the text envelopes wrapping them.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `OutboundMessage` | Client → Broker | Publish a payload on a topic |
//! | `SubscriptionFrame` | Client → Broker | Subscribe/unsubscribe a topic |
//! | `InboundMessage` | Broker → Client | Delivery on a subscribed topic |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `action` | Action vocabulary and slider axes |
//! | `command` | Control command payloads and topics |
//! | `message` | Wire envelopes and inbound parsing |

// ============================================================================
// Submodules
// ============================================================================

/// Action vocabulary and slider axes.
pub mod action;

/// Control command payloads and topics.
pub mod command;

/// Wire envelopes and inbound parsing.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use action::{Action, Axis, SLIDER_MAX, SLIDER_MIDPOINT};
pub use command::{
    CONTROL_TOPIC, ControlCommand, PRESET_TOPIC, STATUS_REQUEST_ALL, STATUS_REQUEST_TOPIC,
};
pub use message::{
    ACK_MARKER, InboundMessage, OutboundMessage, STATUS_MARKER, SubscriptionAction,
    SubscriptionFrame,
};
