//! Control command dispatcher.
//!
//! Converts held buttons, one-shot buttons and slider moves into
//! [`ControlCommand`]s for a [`CommandSink`], normally the
//! [`ConnectionManager`](crate::ConnectionManager).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rig_link::{Action, ConnectionManager, Dispatcher};
//!
//! # async fn example() -> rig_link::Result<()> {
//! let link = ConnectionManager::builder().url("ws://localhost:8083").build()?;
//! let dispatcher = Dispatcher::new(Arc::new(link.clone()))?;
//! dispatcher.follow(link.watch_status());
//!
//! dispatcher.press(Action::TiltUp)?;   // tilt_up now and every 100 ms
//! dispatcher.release();                // exactly one stop
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | `Dispatcher` and its options |
//! | `levels` | Slider levels per axis |
//! | `session` | Held-gesture session |

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::ControlCommand;

// ============================================================================
// Submodules
// ============================================================================

/// Dispatcher and options.
pub mod core;

/// Slider levels.
pub mod levels;

/// Held-gesture sessions.
mod session;

// ============================================================================
// CommandSink
// ============================================================================

/// Destination of dispatched commands.
pub trait CommandSink: Send + Sync + 'static {
    /// Delivers one command. Must not block.
    fn send_command(&self, command: &ControlCommand);
}

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{DEFAULT_REPEAT_PERIOD, Dispatcher, DispatcherOptions};
pub use levels::SliderLevels;
