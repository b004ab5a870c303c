//! Connection state and the pending queue.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;

use rustc_hash::FxHashSet;

use crate::protocol::OutboundMessage;

// ============================================================================
// ConnectionState
// ============================================================================

/// Socket state of a connection manager.
///
/// Transitions are `Disconnected → Connecting → Connected → Disconnected`.
/// A failed attempt returns from `Connecting` to `Disconnected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Disconnected,
    /// An attempt is in flight.
    Connecting,
    /// Socket open.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

// ============================================================================
// ConnectionStatus
// ============================================================================

/// User-facing connection status.
///
/// Same as [`ConnectionState`], except that a link which gave up reconnecting
/// reports [`ConnectionStatus::Exhausted`] until the caller connects again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// No socket.
    #[default]
    Disconnected,
    /// An attempt is in flight.
    Connecting,
    /// Socket open.
    Connected,
    /// Reconnect attempts exhausted. Needs an explicit `connect()`.
    Exhausted,
}

impl ConnectionStatus {
    /// Returns `true` if connected.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if reconnection gave up.
    #[inline]
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Returns the underlying socket state.
    #[inline]
    #[must_use]
    pub const fn state(self) -> ConnectionState {
        match self {
            Self::Connecting => ConnectionState::Connecting,
            Self::Connected => ConnectionState::Connected,
            Self::Disconnected | Self::Exhausted => ConnectionState::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("reconnect failed"),
            other => fmt::Display::fmt(&other.state(), f),
        }
    }
}

// ============================================================================
// PendingQueue
// ============================================================================

/// FIFO of messages waiting for a connected socket.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    messages: VecDeque<OutboundMessage>,
    cap: Option<usize>,
}

impl PendingQueue {
    /// Creates a queue, optionally capped.
    pub(crate) fn new(cap: Option<usize>) -> Self {
        Self {
            messages: VecDeque::new(),
            cap,
        }
    }

    /// Appends a message.
    ///
    /// With `capped` set, the oldest messages are evicted first so the queue
    /// stays within its cap. Returns how many were evicted.
    pub(crate) fn push(&mut self, message: OutboundMessage, capped: bool) -> usize {
        let mut evicted = 0;
        if let Some(cap) = self.cap.filter(|_| capped) {
            while self.messages.len() >= cap.max(1) {
                self.messages.pop_front();
                evicted += 1;
            }
        }

        self.messages.push_back(message);
        evicted
    }

    /// Removes and returns every message in order.
    pub(crate) fn take_all(&mut self) -> VecDeque<OutboundMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Puts unsent messages back ahead of anything queued since.
    pub(crate) fn requeue_front(&mut self, mut unsent: VecDeque<OutboundMessage>) {
        unsent.append(&mut self.messages);
        self.messages = unsent;
    }

    /// Returns the number of queued messages.
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    /// Drops every message. Returns how many were dropped.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.messages.len();
        self.messages.clear();
        dropped
    }
}

// ============================================================================
// LinkState
// ============================================================================

/// Mutable state shared by the handles and the event loop.
///
/// Always accessed under one lock so publishes and socket events observe a
/// consistent state.
#[derive(Debug)]
pub(crate) struct LinkState {
    /// Socket state.
    pub(crate) state: ConnectionState,
    /// Reconnect attempts gave up.
    pub(crate) exhausted: bool,
    /// Consecutive failed reconnect attempts.
    pub(crate) attempts: u32,
    /// Messages waiting for a connected socket.
    pub(crate) pending: PendingQueue,
    /// Topics re-sent on every connect.
    pub(crate) subscriptions: FxHashSet<String>,
}

impl LinkState {
    /// Creates a disconnected state.
    pub(crate) fn new(max_pending: Option<usize>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            exhausted: false,
            attempts: 0,
            pending: PendingQueue::new(max_pending),
            subscriptions: FxHashSet::default(),
        }
    }

    /// Derives the user-facing status.
    pub(crate) fn status(&self) -> ConnectionStatus {
        match self.state {
            ConnectionState::Connecting => ConnectionStatus::Connecting,
            ConnectionState::Connected => ConnectionStatus::Connected,
            ConnectionState::Disconnected if self.exhausted => ConnectionStatus::Exhausted,
            ConnectionState::Disconnected => ConnectionStatus::Disconnected,
        }
    }

    /// Returns the subscribed topics in a stable order.
    pub(crate) fn sorted_subscriptions(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.subscriptions.iter().cloned().collect();
        topics.sort();
        topics
    }
}

// ============================================================================
// Tests
// ============================================================================
