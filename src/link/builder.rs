//! Builder for connection managers.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use rig_link::ConnectionManager;
//!
//! # async fn example() -> rig_link::Result<()> {
//! let link = ConnectionManager::builder()
//!     .url("ws://192.168.1.59:8083")
//!     .max_attempts(5)
//!     .reconnect_delay(Duration::from_secs(3))
//!     .build()?;
//! link.connect()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Connector, WebSocketConnector, validate_ws_url};

use super::manager::ConnectionManager;
use super::options::{LinkOptions, ReconnectPolicy};
use super::shared::Shared;

// ============================================================================
// LinkBuilder
// ============================================================================

/// Builder for configuring a [`ConnectionManager`].
///
/// Use [`ConnectionManager::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct LinkBuilder {
    /// Broker URL.
    url: Option<String>,
    /// Link options.
    options: LinkOptions,
    /// Socket factory override.
    connector: Option<Arc<dyn Connector>>,
}

impl fmt::Debug for LinkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkBuilder")
            .field("url", &self.url)
            .field("options", &self.options)
            .field("connector", &self.connector.as_ref().map(|c| c.name()))
            .finish()
    }
}

// ============================================================================
// LinkBuilder Implementation
// ============================================================================

impl LinkBuilder {
    /// Creates a builder with default options and no URL.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the broker URL (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Replaces all options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: LinkOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the reconnect policy.
    #[inline]
    #[must_use]
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.options.reconnect = policy;
        self
    }

    /// Sets the number of automatic reconnect attempts.
    #[inline]
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.options.reconnect.max_attempts = max_attempts;
        self
    }

    /// Sets the delay between reconnect attempts.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.options.reconnect.base_delay = delay;
        self
    }

    /// Sets the timeout for a single connect attempt.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Caps the messages queued while disconnected, dropping the oldest when
    /// full. Must be at least 1.
    #[inline]
    #[must_use]
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.options.max_pending = Some(max_pending);
        self
    }

    /// Uses a custom connector instead of [`WebSocketConnector`].
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Builds the manager and spawns its event loop.
    ///
    /// The manager starts disconnected; call
    /// [`ConnectionManager::connect`] to open the socket.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL is missing, not `ws`/`wss`, a
    ///   timeout is zero, or `max_pending` is zero
    /// - [`Error::Config`] if called outside a tokio runtime
    /// - [`Error::Url`] if the URL does not parse
    pub fn build(self) -> Result<ConnectionManager> {
        let url = self.validate_url()?;
        self.validate_options()?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            Error::config("ConnectionManager must be built inside a tokio runtime")
        })?;

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WebSocketConnector));

        let shared = Shared::new(url, self.options, connector);
        Ok(ConnectionManager::spawn(shared, &runtime))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl LinkBuilder {
    /// Validates the broker URL.
    fn validate_url(&self) -> Result<Url> {
        let raw = self.url.as_deref().ok_or_else(|| {
            Error::config(
                "Broker URL is required. Use .url() to set it.\n\
                 Example: ConnectionManager::builder().url(\"ws://localhost:8083\")",
            )
        })?;

        validate_ws_url(raw)
    }

    /// Validates timing options.
    fn validate_options(&self) -> Result<()> {
        if self.options.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be greater than zero"));
        }
        if self.options.max_pending == Some(0) {
            return Err(Error::config(
                "max_pending must be at least 1. Omit it for an unbounded queue",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = LinkBuilder::new();
        assert!(builder.url.is_none());
        assert!(builder.connector.is_none());
        assert_eq!(builder.options, LinkOptions::default());
    }

    #[test]
    fn test_setters() {
        let builder = LinkBuilder::new()
            .url("ws://localhost:8083")
            .max_attempts(2)
            .reconnect_delay(Duration::from_millis(10))
            .connect_timeout(Duration::from_secs(1))
            .max_pending(4);

        assert_eq!(builder.url.as_deref(), Some("ws://localhost:8083"));
        assert_eq!(builder.options.reconnect.max_attempts, 2);
        assert_eq!(builder.options.reconnect.base_delay, Duration::from_millis(10));
        assert_eq!(builder.options.connect_timeout, Duration::from_secs(1));
        assert_eq!(builder.options.max_pending, Some(4));
    }

    #[tokio::test]
    async fn test_build_fails_without_url() {
        let err = LinkBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("URL is required"));
    }

    #[tokio::test]
    async fn test_build_rejects_http_scheme() {
        let err = LinkBuilder::new().url("http://localhost:8083").build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_build_rejects_unparsable_url() {
        let err = LinkBuilder::new().url("not a url").build().unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[tokio::test]
    async fn test_build_rejects_zero_timeout() {
        let err = LinkBuilder::new()
            .url("ws://localhost:8083")
            .connect_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("connect_timeout"));
    }

    #[tokio::test]
    async fn test_build_rejects_zero_max_pending() {
        let err = LinkBuilder::new()
            .url("ws://localhost:8083")
            .max_pending(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("max_pending"));
    }

    #[test]
    fn test_build_outside_runtime() {
        let err = LinkBuilder::new().url("ws://localhost:8083").build().unwrap_err();
        assert!(err.to_string().contains("tokio runtime"));
    }

    #[tokio::test]
    async fn test_build_starts_disconnected() {
        let link = LinkBuilder::new().url("wss://broker.local/mqtt").build().expect("build");
        assert_eq!(link.url().as_str(), "wss://broker.local/mqtt");
        assert_eq!(link.status(), crate::link::ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = LinkBuilder::new().url("ws://localhost:8083");
        let cloned = builder.clone();
        assert_eq!(builder.url, cloned.url);
    }
}
