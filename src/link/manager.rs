//! Connection manager handle.
//!
//! [`ConnectionManager`] is a cheap, cloneable handle to one logical pub/sub
//! session. Every method returns immediately; socket work happens on the
//! event loop task.
//!
//! # Publishing
//!
//! Publishes are fire-and-forget. Each message joins the pending queue and
//! is written as soon as the link is connected, strictly in publish order.
//! A publish never fails because the link is down.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, trace, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::identifiers::ListenerId;
use crate::observer::LinkObserver;
use crate::protocol::OutboundMessage;

use super::builder::LinkBuilder;
use super::event_loop::{self, LoopCommand};
use super::options::LinkOptions;
use super::shared::Shared;
use super::state::{ConnectionState, ConnectionStatus};

// ============================================================================
// ConnectionManager
// ============================================================================

/// Handle to a reconnecting pub/sub link.
///
/// Dropping the last handle closes the socket and stops the event loop.
///
/// # Thread Safety
///
/// `ConnectionManager` is `Send + Sync`. Publishes from any task are
/// serialized through one lock together with socket events.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

/// Owned by the handles only; the event loop holds `Shared`.
struct ManagerInner {
    shared: Arc<Shared>,
    command_tx: mpsc::UnboundedSender<LoopCommand>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("id", &self.inner.shared.id)
            .field("url", &self.inner.shared.url.as_str())
            .field("status", &self.status())
            .finish()
    }
}

// ============================================================================
// Construction
// ============================================================================

impl ConnectionManager {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> LinkBuilder {
        LinkBuilder::new()
    }

    /// Spawns the event loop on `runtime`.
    pub(crate) fn spawn(shared: Shared, runtime: &Handle) -> Self {
        let shared = Arc::new(shared);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        runtime.spawn(event_loop::run(Arc::clone(&shared), command_rx));

        Self {
            inner: Arc::new(ManagerInner { shared, command_tx }),
        }
    }

    #[inline]
    fn shared(&self) -> &Shared {
        &self.inner.shared
    }

    /// Sends a command to the event loop.
    fn command(&self, command: LoopCommand) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .map_err(|_| Error::ConnectionClosed)
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl ConnectionManager {
    /// Returns the link identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared().id
    }

    /// Returns the broker URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.shared().url
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &LinkOptions {
        &self.shared().options
    }

    /// Returns the socket state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared().read(|s| s.state)
    }

    /// Returns the user-facing status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.shared().read(|s| s.status())
    }

    /// Returns a receiver that tracks status changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared().watch_status()
    }

    /// Returns consecutive failed reconnect attempts.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared().read(|s| s.attempts)
    }

    /// Returns the subscribed topics, sorted.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        self.shared().read(|s| s.sorted_subscriptions())
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

impl ConnectionManager {
    /// Opens the socket.
    ///
    /// Idempotent: while connecting or connected no second socket is opened.
    /// Also resumes a link whose reconnect attempts were exhausted, and skips
    /// the remaining delay of a scheduled reconnect.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] if the manager was shut down.
    pub fn connect(&self) -> Result<()> {
        self.shared().update(|s| s.exhausted = false);
        self.command(LoopCommand::Connect)
    }

    /// Waits until connected.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if not connected within `wait`
    /// - [`Error::ReconnectExhausted`] if the link gives up first
    /// - [`Error::ConnectionClosed`] if the manager shuts down
    pub async fn wait_connected(&self, wait: Duration) -> Result<()> {
        let mut status_rx = self.watch_status();
        let max_attempts = self.options().reconnect.max_attempts;

        let waited = timeout(
            wait,
            status_rx.wait_for(|status| status.is_connected() || status.is_exhausted()),
        )
        .await;

        match waited {
            Err(_) => Err(Error::connection_timeout(wait.as_millis() as u64)),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Ok(Ok(status)) if status.is_exhausted() => {
                Err(Error::reconnect_exhausted(max_attempts))
            }
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// Closes the socket without reconnecting.
    ///
    /// The pending queue is kept for the next `connect()`; see
    /// [`clear_pending`](Self::clear_pending).
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] if the manager was shut down.
    pub fn disconnect(&self) -> Result<()> {
        self.command(LoopCommand::Disconnect)
    }

    /// Closes the socket and stops the event loop.
    ///
    /// Later operations on any handle return [`Error::ConnectionClosed`].
    pub fn shutdown(&self) {
        let _ = self.command(LoopCommand::Shutdown);
    }
}

// ============================================================================
// Pub/Sub
// ============================================================================

impl ConnectionManager {
    /// Registers interest in `topic`.
    ///
    /// Sent now when connected, and re-sent on every later connect.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `topic` is empty.
    pub fn subscribe(&self, topic: impl Into<String>) -> Result<()> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(Error::invalid_argument("topic must not be empty"));
        }

        let send_now = self.shared().update(|s| {
            s.subscriptions.insert(topic.clone()) && s.state == ConnectionState::Connected
        });

        debug!(topic = %topic, send_now, "Subscribed");
        if send_now {
            let _ = self.command(LoopCommand::Subscribe(topic));
        }
        Ok(())
    }

    /// Forgets `topic`. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, topic: &str) -> bool {
        let (removed, connected) = self.shared().update(|s| {
            (
                s.subscriptions.remove(topic),
                s.state == ConnectionState::Connected,
            )
        });

        if removed && connected {
            let _ = self.command(LoopCommand::Unsubscribe(topic.to_string()));
        }
        removed
    }

    /// Publishes `payload` on `topic`.
    ///
    /// Never fails: while disconnected the message waits in the pending
    /// queue.
    pub fn publish(&self, topic: impl Into<String>, payload: impl Into<String>) {
        let message = OutboundMessage::new(topic, payload);
        let topic = message.topic.clone();

        // The cap bounds the backlog of a down link; connected traffic is
        // never evicted.
        let (evicted, pending, connected) = self.shared().update(|s| {
            let connected = s.state == ConnectionState::Connected;
            let evicted = s.pending.push(message, !connected);
            (evicted, s.pending.len(), connected)
        });

        if evicted > 0 {
            warn!(
                topic = %topic,
                evicted,
                pending,
                "Pending queue full, oldest messages dropped"
            );
        }

        if connected {
            trace!(topic = %topic, "Publish");
            let _ = self.command(LoopCommand::Flush);
        } else {
            debug!(topic = %topic, pending, "Link not connected, message queued");
        }
    }

    /// Returns the number of queued messages.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.shared().read(|s| s.pending.len())
    }

    /// Drops every queued message. Returns how many were dropped.
    pub fn clear_pending(&self) -> usize {
        let dropped = self.shared().update(|s| s.pending.clear());
        if dropped > 0 {
            debug!(dropped, "Pending queue cleared");
        }
        dropped
    }
}

// ============================================================================
// Observers
// ============================================================================

impl ConnectionManager {
    /// Registers an observer.
    ///
    /// Observers that hold a clone of this manager keep the link alive until
    /// they are removed.
    pub fn add_observer(&self, observer: Arc<dyn LinkObserver>) -> ListenerId {
        self.shared().observers().add(observer)
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn remove_observer(&self, id: ListenerId) -> bool {
        self.shared().observers().remove(id)
    }
}

// ============================================================================
// Tests
// ============================================================================
