//! Held-gesture sessions.

// ============================================================================
// Imports
// ============================================================================

use tokio::task::JoinHandle;

use crate::protocol::Action;

// ============================================================================
// DispatchSession
// ============================================================================

/// A held gesture and the task repeating its command.
///
/// Exists from press to release. The repeat task only emits while the
/// session is active and still current, so cancelling under the dispatcher
/// lock stops emission immediately even if a tick is already in flight.
#[derive(Debug)]
pub(crate) struct DispatchSession {
    /// Repeated action.
    pub(crate) action: Action,
    /// Distinguishes this session from earlier ones.
    pub(crate) generation: u64,
    /// Repeat task.
    task: JoinHandle<()>,
    /// Cleared on cancel.
    active: bool,
}

impl DispatchSession {
    /// Wraps a running repeat task.
    pub(crate) fn new(action: Action, generation: u64, task: JoinHandle<()>) -> Self {
        Self {
            action,
            generation,
            task,
            active: true,
        }
    }

    /// Returns `true` until cancelled.
    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` if a tick from `generation` may emit.
    #[inline]
    pub(crate) fn accepts_tick(&self, generation: u64) -> bool {
        self.active && self.generation == generation
    }

    /// Stops the repeat task. Idempotent.
    pub(crate) fn cancel(&mut self) {
        if self.active {
            self.active = false;
            self.task.abort();
        }
    }
}

impl Drop for DispatchSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================
