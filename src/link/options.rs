//! Link configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use rig_link::LinkOptions;
//!
//! let options = LinkOptions::new()
//!     .with_max_attempts(10)
//!     .with_reconnect_delay(Duration::from_secs(1))
//!     .with_max_pending(256);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default number of automatic reconnect attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Default timeout for a single connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// How the link recovers from an unexpected socket loss.
///
/// The delay is fixed: every attempt waits `base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Automatic attempts before giving up.
    pub max_attempts: u32,
    /// Wait before each attempt.
    pub base_delay: Duration,
}

impl ReconnectPolicy {
    /// Creates a policy.
    #[inline]
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Returns the wait before attempt number `attempt` (1-based).
    #[inline]
    #[must_use]
    pub const fn delay_for(&self, _attempt: u32) -> Duration {
        self.base_delay
    }

    /// Returns `true` if attempt number `attempt` (1-based) may run.
    #[inline]
    #[must_use]
    pub const fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RECONNECT_DELAY)
    }
}

// ============================================================================
// LinkOptions
// ============================================================================

/// Connection manager options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOptions {
    /// Reconnect behavior.
    pub reconnect: ReconnectPolicy,

    /// Timeout for a single connect attempt.
    pub connect_timeout: Duration,

    /// Capacity of the queue while disconnected. `None` means unbounded.
    ///
    /// When full, the oldest message is dropped. Publishes made while
    /// connected are never dropped.
    pub max_pending: Option<usize>,
}

// ============================================================================
// Constructors
// ============================================================================

impl LinkOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reconnect: ReconnectPolicy::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RECONNECT_DELAY),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_pending: None,
        }
    }
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl LinkOptions {
    /// Replaces the reconnect policy.
    #[inline]
    #[must_use]
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Sets the number of automatic reconnect attempts.
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.reconnect.max_attempts = max_attempts;
        self
    }

    /// Sets the delay between reconnect attempts.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect.base_delay = delay;
        self
    }

    /// Sets the timeout for a single connect attempt.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Caps the pending queue.
    #[inline]
    #[must_use]
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = Some(max_pending);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LinkOptions::new();
        assert_eq!(options.reconnect.max_attempts, 5);
        assert_eq!(options.reconnect.base_delay, Duration::from_millis(3000));
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert!(options.max_pending.is_none());
        assert_eq!(options, LinkOptions::default());
    }

    #[test]
    fn test_builder_chain() {
        let options = LinkOptions::new()
            .with_max_attempts(2)
            .with_reconnect_delay(Duration::from_millis(50))
            .with_connect_timeout(Duration::from_secs(1))
            .with_max_pending(8);

        assert_eq!(options.reconnect, ReconnectPolicy::new(2, Duration::from_millis(50)));
        assert_eq!(options.connect_timeout, Duration::from_secs(1));
        assert_eq!(options.max_pending, Some(8));
    }

    #[test]
    fn test_delay_is_fixed() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), policy.delay_for(5));
    }

    #[test]
    fn test_allows() {
        let policy = ReconnectPolicy::new(3, Duration::ZERO);
        assert!(policy.allows(1));
        assert!(policy.allows(3));
        assert!(!policy.allows(4));
        assert!(!ReconnectPolicy::new(0, Duration::ZERO).allows(1));
    }
}
