//! Socket connectors.
//!
//! The link and the frame receiver never open sockets themselves. They ask a
//! [`Connector`] for a [`TransportSocket`], which lets applications plug in
//! their own transport (TLS settings, proxies, in-process brokers) while the
//! default [`WebSocketConnector`] dials the URL with tokio-tungstenite.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::pin::Pin;
use std::result::Result as StdResult;

use async_trait::async_trait;
use futures_util::{Sink, Stream, StreamExt};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Outgoing half of a socket.
pub type SocketSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Incoming half of a socket.
pub type SocketStream = Pin<Box<dyn Stream<Item = StdResult<Message, WsError>> + Send>>;

// ============================================================================
// TransportSocket
// ============================================================================

/// An open, message-oriented socket split into its two halves.
pub struct TransportSocket {
    /// Outgoing messages.
    pub(crate) sink: SocketSink,
    /// Incoming messages.
    pub(crate) stream: SocketStream,
}

impl TransportSocket {
    /// Wraps a sink and a stream into a socket.
    pub fn new<S, R>(sink: S, stream: R) -> Self
    where
        S: Sink<Message, Error = WsError> + Send + 'static,
        R: Stream<Item = StdResult<Message, WsError>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }

    /// Splits the socket into its halves.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (SocketSink, SocketStream) {
        (self.sink, self.stream)
    }
}

impl fmt::Debug for TransportSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSocket").finish_non_exhaustive()
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Factory for transport sockets.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a socket to `url`.
    async fn connect(&self, url: &Url) -> Result<TransportSocket>;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;
}

// ============================================================================
// WebSocketConnector
// ============================================================================

/// Connector dialing `ws://` and `wss://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &Url) -> Result<TransportSocket> {
        let (ws_stream, response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::connection(format!("WebSocket connect to {url} failed: {e}")))?;

        debug!(%url, status = %response.status(), "WebSocket handshake completed");

        let (sink, stream) = ws_stream.split();
        Ok(TransportSocket::new(sink, stream))
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

// ============================================================================
// URL Validation
// ============================================================================

/// Parses `raw` and rejects schemes other than `ws` and `wss`.
pub(crate) fn validate_ws_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(Error::config(format!(
            "Unsupported URL scheme '{other}' in {url}. Expected ws:// or wss://"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
