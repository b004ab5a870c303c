//! Frame stream receiver.
//!
//! Reads frames from a dedicated socket on its own task. The latest frame,
//! the measured frame rate and the stream state are published through
//! `watch` channels: consumers always see the newest frame and never apply
//! backpressure to the source.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Result;
use crate::transport::{Connector, SocketSink, SocketStream, WebSocketConnector, validate_ws_url};

use super::frame::{Frame, FrameData};
use super::stats::FrameStats;

// ============================================================================
// StreamState
// ============================================================================

/// State of a frame stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    /// Receiving frames.
    Streaming,
    /// The channel failed. The last frame stays available.
    Errored(String),
    /// The channel closed, locally or remotely.
    Closed,
}

impl StreamState {
    /// Returns `true` once the stream has ended.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Streaming)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming => f.write_str("streaming"),
            Self::Errored(message) => write!(f, "error: {message}"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

// ============================================================================
// FrameReceiver
// ============================================================================

/// Receives frames from a frame source.
///
/// Dropping the receiver closes the socket.
///
/// # Example
///
/// ```no_run
/// use rig_link::FrameReceiver;
///
/// # async fn example() -> rig_link::Result<()> {
/// let receiver = FrameReceiver::connect("ws://localhost:8765").await?;
/// let mut frames = receiver.watch_frames();
///
/// while frames.changed().await.is_ok() {
///     if let Some(frame) = frames.borrow_and_update().as_ref() {
///         println!("frame #{} ({} bytes)", frame.sequence(), frame.len());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct FrameReceiver {
    url: Url,
    frame_rx: watch::Receiver<Option<Frame>>,
    fps_rx: watch::Receiver<Option<f64>>,
    state_rx: watch::Receiver<StreamState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

/// Channels written by the reader task.
struct Publishers {
    frame_tx: watch::Sender<Option<Frame>>,
    fps_tx: watch::Sender<Option<f64>>,
    state_tx: watch::Sender<StreamState>,
}

impl fmt::Debug for FrameReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameReceiver")
            .field("url", &self.url.as_str())
            .field("state", &*self.state_rx.borrow())
            .field("fps", &*self.fps_rx.borrow())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Construction
// ============================================================================

impl FrameReceiver {
    /// Connects to a frame source with the WebSocket connector.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Config`] / [`crate::Error::Url`] for an invalid URL
    /// - [`crate::Error::Connection`] if the source is unreachable
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(&WebSocketConnector, url).await
    }

    /// Connects to a frame source with a custom connector.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect).
    pub async fn connect_with(connector: &dyn Connector, url: &str) -> Result<Self> {
        let url = validate_ws_url(url)?;
        let (sink, stream) = connector.connect(&url).await?.into_parts();
        info!(url = %url, "Frame stream connected");

        let (frame_tx, frame_rx) = watch::channel(None);
        let (fps_tx, fps_rx) = watch::channel(None);
        let (state_tx, state_rx) = watch::channel(StreamState::Streaming);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let publishers = Publishers {
            frame_tx,
            fps_tx,
            state_tx,
        };
        let task = tokio::spawn(read_frames(
            url.clone(),
            sink,
            stream,
            shutdown_rx,
            publishers,
        ));

        Ok(Self {
            url,
            frame_rx,
            fps_rx,
            state_rx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl FrameReceiver {
    /// Returns the frame source URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the most recent frame.
    #[must_use]
    pub fn latest_frame(&self) -> Option<Frame> {
        self.frame_rx.borrow().clone()
    }

    /// Returns a receiver notified on every new frame.
    #[must_use]
    pub fn watch_frames(&self) -> watch::Receiver<Option<Frame>> {
        self.frame_rx.clone()
    }

    /// Returns the last reported frame rate.
    #[must_use]
    pub fn fps(&self) -> Option<f64> {
        *self.fps_rx.borrow()
    }

    /// Returns a receiver notified on every frame rate report.
    #[must_use]
    pub fn watch_fps(&self) -> watch::Receiver<Option<f64>> {
        self.fps_rx.clone()
    }

    /// Returns the stream state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        self.state_rx.borrow().clone()
    }

    /// Returns a receiver notified on state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state_rx.clone()
    }
}

// ============================================================================
// Teardown
// ============================================================================

impl FrameReceiver {
    /// Closes the socket and waits for the reader task to finish.
    ///
    /// No frame is published afterwards.
    pub async fn close(mut self) {
        self.signal_shutdown();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn signal_shutdown(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

impl Drop for FrameReceiver {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}

// ============================================================================
// Reader Task
// ============================================================================

/// Reads frames until shutdown, close or error.
async fn read_frames(
    url: Url,
    mut sink: SocketSink,
    mut stream: SocketStream,
    mut shutdown_rx: oneshot::Receiver<()>,
    publishers: Publishers,
) {
    let mut stats = FrameStats::new();
    let mut sequence = 0u64;

    let end_state = loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                let _ = sink.close().await;
                debug!(url = %url, "Frame stream closed locally");
                break StreamState::Closed;
            }

            message = stream.next() => {
                let data = match message {
                    Some(Ok(Message::Text(text))) => FrameData::Text(Arc::from(text.as_str())),
                    Some(Ok(Message::Binary(bytes))) => FrameData::Binary(Arc::from(&bytes[..])),
                    Some(Ok(Message::Close(frame))) => {
                        warn!(url = %url, ?frame, "Frame stream closed by source");
                        break StreamState::Closed;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!(url = %url, error = %e, "Frame stream error");
                        break StreamState::Errored(e.to_string());
                    }
                    None => {
                        warn!(url = %url, "Frame stream ended");
                        break StreamState::Closed;
                    }
                };

                sequence += 1;
                publishers.frame_tx.send_replace(Some(Frame::new(data, sequence)));

                if let Some(fps) = stats.record(Instant::now()) {
                    debug!(url = %url, fps, "Frame rate");
                    publishers.fps_tx.send_replace(Some(fps));
                }
            }
        }
    };

    publishers.state_tx.send_replace(end_state);
}

// ============================================================================
// Tests
// ============================================================================
