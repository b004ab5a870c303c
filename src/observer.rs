//! Link observers.
//!
//! Applications learn about the link through a [`LinkObserver`]: one method
//! per event kind, each with a no-op default so observers only implement what
//! they care about.
//!
//! | Method | Fired when |
//! |--------|------------|
//! | `on_connect` | The socket is open and subscriptions are re-sent |
//! | `on_disconnect` | The socket closed, requested or not |
//! | `on_error` | A transport error occurred |
//! | `on_reconnect_exhausted` | Automatic reconnection gave up |
//! | `on_message` | Any inbound message |
//! | `on_ack` | Inbound message on an acknowledgment topic |
//! | `on_status` | Inbound message on a status topic |
//!
//! Observers run on the link's event loop and must return quickly.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::Error;
use crate::identifiers::ListenerId;
use crate::protocol::InboundMessage;

// ============================================================================
// Types
// ============================================================================

/// An inbound message classified as an acknowledgment or status update.
///
/// Transient: passed to observers and not retained by the link.
pub type AckRecord = InboundMessage;

// ============================================================================
// LinkObserver
// ============================================================================

/// Receives link lifecycle and message events.
pub trait LinkObserver: Send + Sync {
    /// The link is connected.
    fn on_connect(&self) {}

    /// The link is disconnected.
    fn on_disconnect(&self) {}

    /// A transport error occurred. State changes follow separately.
    fn on_error(&self, _error: &Error) {}

    /// Reconnect attempts are exhausted. Fired once per exhaustion.
    fn on_reconnect_exhausted(&self) {}

    /// Any inbound message.
    fn on_message(&self, _message: &InboundMessage) {}

    /// An acknowledgment.
    fn on_ack(&self, _ack: &AckRecord) {}

    /// A status update.
    fn on_status(&self, _status: &AckRecord) {}
}

// ============================================================================
// ObserverRegistry
// ============================================================================

/// Ordered set of registered observers.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<(ListenerId, Arc<dyn LinkObserver>)>>,
}

impl ObserverRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer.
    pub fn add(&self, observer: Arc<dyn LinkObserver>) -> ListenerId {
        let id = ListenerId::next();
        self.observers.write().push((id, observer));
        id
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Returns the number of registered observers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    /// Returns `true` if no observer is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Calls `f` on every observer in registration order.
    ///
    /// Works on a snapshot, so observers may register or remove observers
    /// (or call back into the link) from inside the callback.
    pub fn notify(&self, f: impl Fn(&dyn LinkObserver)) {
        let snapshot: Vec<Arc<dyn LinkObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in &snapshot {
            f(observer.as_ref());
        }
    }
}

// ============================================================================
// AckTracker
// ============================================================================

/// Observer retaining the latest acknowledgment and status update.
///
/// Backs a UI indicator such as "✓ tilt_up".
#[derive(Debug, Default)]
pub struct AckTracker {
    last_ack: Mutex<Option<AckRecord>>,
    last_status: Mutex<Option<AckRecord>>,
}

impl AckTracker {
    /// Creates an empty tracker.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest acknowledgment.
    #[must_use]
    pub fn last_ack(&self) -> Option<AckRecord> {
        self.last_ack.lock().clone()
    }

    /// Returns the latest status update.
    #[must_use]
    pub fn last_status(&self) -> Option<AckRecord> {
        self.last_status.lock().clone()
    }

    /// Short label for the latest acknowledgment.
    ///
    /// Last `/`-separated segment of the ack topic, ignoring anything after
    /// a `:`. For `forklift/control/ack/tilt_up` this is `tilt_up`.
    #[must_use]
    pub fn last_ack_label(&self) -> Option<String> {
        self.last_ack.lock().as_ref().map(|ack| ack_label(&ack.topic))
    }
}

impl LinkObserver for AckTracker {
    fn on_ack(&self, ack: &AckRecord) {
        *self.last_ack.lock() = Some(ack.clone());
    }

    fn on_status(&self, status: &AckRecord) {
        *self.last_status.lock() = Some(status.clone());
    }
}

/// Derives the display label of an ack topic.
fn ack_label(topic: &str) -> String {
    let head = topic.split(':').next().unwrap_or_default();
    head.rsplit('/').next().unwrap_or_default().to_string()
}

// ============================================================================
// Tests
// ============================================================================
