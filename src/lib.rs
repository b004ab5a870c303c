//! rig-link - Control client for a remote camera rig.
//!
//! This library drives a pan/tilt/zoom camera rig over an unreliable
//! pub/sub broker and receives its video feed on a separate socket.
//!
//! # Architecture
//!
//! Two independent channels:
//!
//! - **Control link**: publish/subscribe over one WebSocket, with a pending
//!   queue while disconnected and automatic fixed-delay reconnection
//! - **Frame stream**: one-way frames from the rig, latest frame wins
//!
//! Key design principles:
//!
//! - Each [`ConnectionManager`] owns one socket and one event loop task
//! - Messages published while down are delivered in order on reconnect
//! - Subscriptions survive reconnects and are re-sent before queued messages
//! - A held gesture produces exactly one `stop` when released or interrupted
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rig_link::{Action, ConnectionManager, Dispatcher, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let link = ConnectionManager::builder()
//!         .url("ws://localhost:8083")
//!         .build()?;
//!
//!     link.subscribe("forklift/control/+/ack")?;
//!     link.connect()?;
//!     link.wait_connected(Duration::from_secs(10)).await?;
//!
//!     let dispatcher = Dispatcher::new(Arc::new(link.clone()))?;
//!     dispatcher.follow(link.watch_status());
//!
//!     dispatcher.press(Action::PanLeft)?;
//!     tokio::time::sleep(Duration::from_millis(500)).await;
//!     dispatcher.release();
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`correlator`] | Acknowledgment and status classification |
//! | [`dispatcher`] | Held, one-shot and slider control commands |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`link`] | Connection manager and reconnect policy |
//! | [`observer`] | Link observer trait and registry |
//! | [`protocol`] | Actions, commands and wire envelopes |
//! | [`transport`] | Socket connectors |
//! | [`video`] | Frame stream receiver |

// ============================================================================
// Modules
// ============================================================================

/// Acknowledgment correlator.
///
/// Routes inbound messages to observers by topic marker.
pub mod correlator;

/// Control command dispatcher.
///
/// Use [`Dispatcher::new()`] with any [`CommandSink`].
pub mod dispatcher;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Connection manager.
///
/// Use [`ConnectionManager::builder()`] to create a link.
pub mod link;

/// Link observers.
pub mod observer;

/// Control channel protocol types.
pub mod protocol;

/// Socket connectors.
///
/// Implement [`Connector`] to run the link over another transport.
pub mod transport;

/// Frame stream receiver.
pub mod video;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

// Correlator types
pub use correlator::{Classification, Correlator};

// Dispatcher types
pub use dispatcher::{CommandSink, Dispatcher, DispatcherOptions, SliderLevels};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CameraId, DEFAULT_CAMERA_ID, ListenerId};

// Link types
pub use link::{
    ConnectionManager, ConnectionState, ConnectionStatus, LinkBuilder, LinkOptions,
    ReconnectPolicy,
};

// Observer types
pub use observer::{AckRecord, AckTracker, LinkObserver, ObserverRegistry};

// Protocol types
pub use protocol::{Action, Axis, ControlCommand, InboundMessage, OutboundMessage};

// Transport types
pub use transport::{Connector, TransportSocket, WebSocketConnector};

// Video types
pub use video::{Frame, FrameData, FrameReceiver, FrameStats, StreamState};
