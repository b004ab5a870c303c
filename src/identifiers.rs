//! Type-safe identifiers.
//!
//! Newtype wrappers keep camera targets and listener handles from being
//! mixed up with arbitrary strings and integers.
//!
//! | Type | Wraps | Purpose |
//! |------|-------|---------|
//! | [`CameraId`] | `String` | Target camera in control payloads |
//! | [`ListenerId`] | `u64` | Handle returned when registering an observer |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Camera addressed when no target is given.
pub const DEFAULT_CAMERA_ID: &str = "local_camera_right";

// ============================================================================
// CameraId
// ============================================================================

/// Identifier of a camera on the remote rig.
///
/// Serialized as a bare string in the `id` field of control payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    /// Creates a camera identifier.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CameraId {
    fn default() -> Self {
        Self::new(DEFAULT_CAMERA_ID)
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CameraId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// ListenerId
// ============================================================================

/// Process-wide counter for listener handles.
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle identifying a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocates the next unique listener ID.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        assert_eq!(CameraId::default().as_str(), "local_camera_right");
    }

    #[test]
    fn test_camera_id_serializes_transparently() {
        let id = CameraId::new("local_camera_left");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"local_camera_left\"");
    }

    #[test]
    fn test_listener_ids_are_unique() {
        let a = ListenerId::next();
        let b = ListenerId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_listener_id_display() {
        let id = ListenerId(7);
        assert_eq!(id.to_string(), "listener-7");
    }
}
