//! Transport layer.
//!
//! This module opens the sockets used by the control link and the frame
//! receiver.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐                         ┌─────────────────┐
//! │  ConnectionManager  │       WebSocket         │  Pub/sub broker │
//! │  (control link)     │◄───────────────────────►│  ws://host:8083 │
//! └─────────────────────┘                         └─────────────────┘
//! ┌─────────────────────┐                         ┌─────────────────┐
//! │  FrameReceiver      │       WebSocket         │  Frame source   │
//! │  (video)            │◄────────────────────────│  ws://host:8765 │
//! └─────────────────────┘                         └─────────────────┘
//! ```
//!
//! Both sides obtain their socket from a [`Connector`], so the two channels
//! share no state and a stalled frame stream never delays control traffic.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connector` | `Connector` trait and WebSocket implementation |

// ============================================================================
// Submodules
// ============================================================================

/// Socket connectors.
pub mod connector;

// ============================================================================
// Re-exports
// ============================================================================

pub(crate) use connector::validate_ws_url;
pub use connector::{Connector, SocketSink, SocketStream, TransportSocket, WebSocketConnector};
