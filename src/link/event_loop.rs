//! Connection manager event loop.
//!
//! One tokio task per link owns the socket. Handles talk to it through an
//! unbounded command channel and shared state; the task never blocks them.
//!
//! ```text
//!            Connect                 socket open
//! ┌──────┐ ──────────► ┌────────────┐ ─────────► ┌───────────┐
//! │ Idle │             │ Connecting │            │ Connected │
//! └──────┘ ◄────────── └────────────┘ ◄───────── └───────────┘
//!   ▲     exhausted /        ▲   failed / lost         │
//!   │     Disconnect         │   (wait base_delay)     │ Disconnect
//!   └────────────────────────┴─────────────────────────┘
//! ```
//!
//! The loop ends on `Shutdown` or when every handle is dropped.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{OutboundMessage, SubscriptionFrame};
use crate::transport::{SocketSink, TransportSocket};

use super::shared::Shared;
use super::state::ConnectionState;

// ============================================================================
// LoopCommand
// ============================================================================

/// Commands sent by manager handles.
#[derive(Debug)]
pub(crate) enum LoopCommand {
    /// Open the socket unless already connecting or connected.
    Connect,
    /// Send queued messages.
    Flush,
    /// Send a subscribe frame.
    Subscribe(String),
    /// Send an unsubscribe frame.
    Unsubscribe(String),
    /// Close the socket without reconnecting.
    Disconnect,
    /// Close the socket and stop the loop.
    Shutdown,
}

// ============================================================================
// Outcomes
// ============================================================================

/// How a connect attempt ended.
enum AttemptOutcome {
    /// The connector returned.
    Finished(Result<TransportSocket>),
    /// Disconnect requested during the attempt.
    Cancelled,
    /// Shutdown requested during the attempt.
    Shutdown,
}

/// How a connected session ended.
enum SessionEnd {
    /// Closed by `disconnect()`.
    Requested,
    /// Closed by the broker or a transport error.
    Lost,
    /// Closed by `shutdown()`.
    Shutdown,
}

// ============================================================================
// Event Loop
// ============================================================================

/// Runs the link until shutdown.
pub(crate) async fn run(shared: Arc<Shared>, mut commands: mpsc::UnboundedReceiver<LoopCommand>) {
    debug!(link = %shared.id, url = %shared.url, "Event loop started");

    loop {
        match commands.recv().await {
            Some(LoopCommand::Connect) => {
                if run_cycle(&shared, &mut commands).await.is_break() {
                    break;
                }
            }

            Some(LoopCommand::Shutdown) | None => break,

            // Queued work waits for the next session.
            Some(command) => trace!(?command, "Ignored while disconnected"),
        }
    }

    shared.update(|s| s.state = ConnectionState::Disconnected);
    debug!(link = %shared.id, "Event loop terminated");
}

/// Connects, runs sessions and reconnects until idle or shutdown.
///
/// Returns `Break` on shutdown.
async fn run_cycle(
    shared: &Shared,
    commands: &mut mpsc::UnboundedReceiver<LoopCommand>,
) -> ControlFlow<()> {
    let policy = shared.options.reconnect;

    loop {
        let attempts = shared.update(|s| {
            s.state = ConnectionState::Connecting;
            s.attempts
        });
        info!(url = %shared.url, connector = shared.connector.name(), attempts, "Connecting");

        match try_connect(shared, commands).await {
            AttemptOutcome::Finished(Ok(socket)) => match run_session(shared, commands, socket).await {
                SessionEnd::Requested => return ControlFlow::Continue(()),
                SessionEnd::Shutdown => return ControlFlow::Break(()),
                SessionEnd::Lost => {}
            },

            AttemptOutcome::Finished(Err(e)) => {
                warn!(url = %shared.url, error = %e, "Connect attempt failed");
                shared.observers().notify(|o| o.on_error(&e));
                mark_disconnected(shared);
            }

            AttemptOutcome::Cancelled => {
                debug!("Connect attempt cancelled");
                mark_disconnected(shared);
                return ControlFlow::Continue(());
            }

            AttemptOutcome::Shutdown => return ControlFlow::Break(()),
        }

        let attempt = shared.update(|s| {
            s.attempts = s.attempts.saturating_add(1);
            s.attempts
        });

        if !policy.allows(attempt) {
            error!(
                url = %shared.url,
                max = policy.max_attempts,
                "Max reconnection attempts reached"
            );
            shared.update(|s| s.exhausted = true);
            shared.observers().notify(|o| o.on_reconnect_exhausted());
            return ControlFlow::Continue(());
        }

        let delay = policy.delay_for(attempt);
        info!(
            attempt,
            max = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Reconnect scheduled"
        );

        let wait = sleep(delay);
        tokio::pin!(wait);

        loop {
            tokio::select! {
                () = &mut wait => break,

                command = commands.recv() => match command {
                    Some(LoopCommand::Connect) => {
                        debug!("Reconnect requested before delay elapsed");
                        break;
                    }
                    Some(LoopCommand::Disconnect) => {
                        debug!("Reconnect cancelled");
                        return ControlFlow::Continue(());
                    }
                    Some(LoopCommand::Shutdown) | None => return ControlFlow::Break(()),
                    Some(_) => {}
                },
            }
        }
    }
}

/// Runs one connect attempt, watching for cancellation.
async fn try_connect(
    shared: &Shared,
    commands: &mut mpsc::UnboundedReceiver<LoopCommand>,
) -> AttemptOutcome {
    let connect_timeout = shared.options.connect_timeout;
    let connect = timeout(connect_timeout, shared.connector.connect(&shared.url));
    tokio::pin!(connect);

    loop {
        tokio::select! {
            result = &mut connect => {
                let result = result
                    .unwrap_or_else(|_| Err(Error::connection_timeout(connect_timeout.as_millis() as u64)));
                return AttemptOutcome::Finished(result);
            }

            command = commands.recv() => match command {
                Some(LoopCommand::Disconnect) => return AttemptOutcome::Cancelled,
                Some(LoopCommand::Shutdown) | None => return AttemptOutcome::Shutdown,
                // Subscriptions and queued messages go out when the session starts.
                Some(_) => {}
            },
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Runs a connected session until the socket closes.
async fn run_session(
    shared: &Shared,
    commands: &mut mpsc::UnboundedReceiver<LoopCommand>,
    socket: TransportSocket,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.into_parts();

    let topics = shared.update(|s| {
        s.state = ConnectionState::Connected;
        s.attempts = 0;
        s.exhausted = false;
        s.sorted_subscriptions()
    });
    info!(url = %shared.url, subscriptions = topics.len(), "Connected");

    for topic in &topics {
        if let Err(e) = send_frame(&mut sink, &SubscriptionFrame::subscribe(topic)).await {
            return lost(shared, Some(e));
        }
    }

    shared.observers().notify(|o| o.on_connect());

    if let Err(e) = flush_pending(shared, &mut sink).await {
        return lost(shared, Some(e));
    }

    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    shared.correlator.handle_text(text.as_str());
                }

                Some(Ok(Message::Binary(data))) => {
                    shared.correlator.handle_text(&String::from_utf8_lossy(&data));
                }

                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Socket closed by broker");
                    return lost(shared, None);
                }

                // Ping/Pong are answered by tungstenite.
                Some(Ok(_)) => {}

                Some(Err(e)) => return lost(shared, Some(e.into())),

                None => {
                    debug!("Socket stream ended");
                    return lost(shared, None);
                }
            },

            command = commands.recv() => match command {
                Some(LoopCommand::Flush) => {
                    if let Err(e) = flush_pending(shared, &mut sink).await {
                        return lost(shared, Some(e));
                    }
                }

                Some(LoopCommand::Subscribe(topic)) => {
                    if let Err(e) = send_frame(&mut sink, &SubscriptionFrame::subscribe(topic)).await {
                        return lost(shared, Some(e));
                    }
                }

                Some(LoopCommand::Unsubscribe(topic)) => {
                    if let Err(e) = send_frame(&mut sink, &SubscriptionFrame::unsubscribe(topic)).await {
                        return lost(shared, Some(e));
                    }
                }

                Some(LoopCommand::Connect) => trace!("Already connected"),

                Some(LoopCommand::Disconnect) => {
                    let _ = sink.close().await;
                    info!(url = %shared.url, "Disconnected by request");
                    mark_disconnected(shared);
                    return SessionEnd::Requested;
                }

                Some(LoopCommand::Shutdown) | None => {
                    let _ = sink.close().await;
                    mark_disconnected(shared);
                    return SessionEnd::Shutdown;
                }
            },
        }
    }
}

/// Records an unexpected socket loss.
fn lost(shared: &Shared, error: Option<Error>) -> SessionEnd {
    match error {
        Some(e) => {
            warn!(url = %shared.url, error = %e, "Connection lost");
            shared.observers().notify(|o| o.on_error(&e));
        }
        None => info!(url = %shared.url, "Connection lost"),
    }

    mark_disconnected(shared);
    SessionEnd::Lost
}

/// Moves to `Disconnected` and notifies observers.
fn mark_disconnected(shared: &Shared) {
    shared.update(|s| s.state = ConnectionState::Disconnected);
    shared.observers().notify(|o| o.on_disconnect());
}

// ============================================================================
// Writes
// ============================================================================

/// Sends a subscription frame.
async fn send_frame(sink: &mut SocketSink, frame: &SubscriptionFrame) -> Result<()> {
    let wire = frame.to_wire()?;
    sink.send(Message::Text(wire.into())).await?;
    debug!(action = ?frame.action, topic = %frame.topic, "Subscription frame sent");
    Ok(())
}

/// Sends every queued message in order.
///
/// On a write failure the unsent messages, including the failed one, go
/// back to the front of the queue.
async fn flush_pending(shared: &Shared, sink: &mut SocketSink) -> Result<()> {
    let mut batch: VecDeque<OutboundMessage> = shared.update(|s| s.pending.take_all());
    if batch.is_empty() {
        return Ok(());
    }

    let count = batch.len();

    while let Some(message) = batch.pop_front() {
        let wire = match message.to_wire() {
            Ok(wire) => wire,
            Err(e) => {
                warn!(topic = %message.topic, error = %e, "Dropping unencodable message");
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(wire.into())).await {
            batch.push_front(message);
            let unsent = batch.len();
            shared.update(|s| s.pending.requeue_front(batch));
            warn!(unsent, "Flush interrupted, messages requeued");
            return Err(e.into());
        }

        trace!(topic = %message.topic, "Sent");
    }

    debug!(count, "Pending messages flushed");
    Ok(())
}
