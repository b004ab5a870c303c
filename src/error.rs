//! Error types for rig-link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use rig_link::{ConnectionManager, Result};
//!
//! async fn example() -> Result<()> {
//!     let link = ConnectionManager::builder()
//!         .url("ws://192.168.1.59:8083")
//!         .build()?;
//!     link.connect()?;
//!     link.set_camera_preset("home")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::ReconnectExhausted`] |
//! | Protocol | [`Error::InvalidArgument`], [`Error::UnknownAction`] |
//! | Frames | [`Error::Frame`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`], [`Error::Base64`], [`Error::Image`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use base64::DecodeError;
use image::ImageError;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use url::ParseError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when link or dispatcher configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport connection failed.
    ///
    /// Returned when the broker or frame endpoint cannot be reached.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection attempt timed out.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The link was shut down.
    ///
    /// Returned by operations on a manager whose event loop has stopped.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Automatic reconnection gave up.
    ///
    /// Only an explicit `connect()` resumes the link after this.
    #[error("Reconnection abandoned after {attempts} attempts")]
    ReconnectExhausted {
        /// Configured maximum number of reconnect attempts.
        attempts: u32,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Action name outside the control vocabulary.
    #[error("Unknown action: {action}")]
    UnknownAction {
        /// The unrecognized action name.
        action: String,
    },

    // ========================================================================
    // Frame Errors
    // ========================================================================
    /// Frame could not be interpreted.
    #[error("Frame error: {message}")]
    Frame {
        /// Description of the frame error.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("Invalid URL: {0}")]
    Url(#[from] ParseError),

    /// Base64 decode error.
    #[error("Base64 error: {0}")]
    Base64(#[from] DecodeError),

    /// Image decode error.
    #[error("Image error: {0}")]
    Image(#[from] ImageError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a reconnect exhausted error.
    #[inline]
    pub fn reconnect_exhausted(attempts: u32) -> Self {
        Self::ReconnectExhausted { attempts }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an unknown action error.
    #[inline]
    pub fn unknown_action(action: impl Into<String>) -> Self {
        Self::UnknownAction {
            action: action.into(),
        }
    }

    /// Creates a frame error.
    #[inline]
    pub fn frame(message: impl Into<String>) -> Self {
        Self::Frame {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::ReconnectExhausted { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors are handled by the reconnect loop.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionTimeout { .. } | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("broker unreachable");
        assert_eq!(err.to_string(), "Connection failed: broker unreachable");
    }

    #[test]
    fn test_reconnect_exhausted_display() {
        let err = Error::reconnect_exhausted(5);
        assert_eq!(err.to_string(), "Reconnection abandoned after 5 attempts");
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::connection_timeout(5000);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::connection_timeout(1000).is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::reconnect_exhausted(3).is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_exhaustion_is_not_recoverable() {
        assert!(Error::connection("reset by peer").is_recoverable());
        assert!(!Error::reconnect_exhausted(5).is_recoverable());
        assert!(!Error::ConnectionClosed.is_recoverable());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::Url(_)));
    }
}
