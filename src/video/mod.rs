//! Frame stream receiver.
//!
//! The camera feed arrives on its own socket, independent of the control
//! link. Each message is one frame; only the latest frame is kept and the
//! frame rate is measured over one-second windows.
//!
//! # Example
//!
//! ```no_run
//! use rig_link::FrameReceiver;
//!
//! # async fn example() -> rig_link::Result<()> {
//! let receiver = FrameReceiver::connect("ws://localhost:8765").await?;
//! let mut fps = receiver.watch_fps();
//!
//! while fps.changed().await.is_ok() {
//!     if let Some(rate) = *fps.borrow_and_update() {
//!         println!("{rate:.1} fps");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | `Frame` and image decoding |
//! | `receiver` | `FrameReceiver` and `StreamState` |
//! | `stats` | Frame rate measurement |

// ============================================================================
// Submodules
// ============================================================================

/// Frames and image decoding.
pub mod frame;

/// Frame stream receiver.
pub mod receiver;

/// Frame rate measurement.
pub mod stats;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{Frame, FrameData};
pub use receiver::{FrameReceiver, StreamState};
pub use stats::{FPS_WINDOW, FrameStats};
