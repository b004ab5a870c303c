//! Connection manager.
//!
//! Maintains one logical pub/sub session over a socket that may drop at any
//! time. Callers publish and subscribe without caring whether the socket is
//! currently up: messages queue while disconnected and subscriptions are
//! replayed on every connect.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rig_link::{AckTracker, ConnectionManager};
//!
//! # async fn example() -> rig_link::Result<()> {
//! let link = ConnectionManager::builder()
//!     .url("ws://localhost:8083")
//!     .build()?;
//!
//! let acks = Arc::new(AckTracker::new());
//! link.add_observer(acks.clone());
//! link.subscribe("forklift/control/+/ack")?;
//!
//! link.connect()?;
//! link.wait_connected(Duration::from_secs(10)).await?;
//! link.request_camera_status();
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | `LinkBuilder` |
//! | `control` | Camera control helpers |
//! | `event_loop` | Socket-owning task |
//! | `manager` | `ConnectionManager` handle |
//! | `options` | `LinkOptions`, `ReconnectPolicy` |
//! | `shared` | State shared with the event loop |
//! | `state` | `ConnectionState`, `ConnectionStatus`, pending queue |

// ============================================================================
// Submodules
// ============================================================================

/// Builder for connection managers.
pub mod builder;

/// Camera control helpers.
mod control;

/// Socket-owning task.
mod event_loop;

/// Connection manager handle.
pub mod manager;

/// Link configuration.
pub mod options;

/// State shared with the event loop.
mod shared;

/// Connection state and pending queue.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::LinkBuilder;
pub use manager::ConnectionManager;
pub use options::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_RECONNECT_DELAY, LinkOptions,
    ReconnectPolicy,
};
pub use state::{ConnectionState, ConnectionStatus};
