//! In-process fixtures for unit tests.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Connector, TransportSocket};

// ============================================================================
// TestBroker
// ============================================================================

/// Instructions for the broker task.
enum BrokerControl {
    /// Send a text frame to the current client.
    Send(String),
    /// Close the current client's socket.
    DropClient,
}

/// Single-client WebSocket broker recording every text frame it receives.
///
/// Accepts clients one after another, so a client that reconnects after
/// [`drop_client`](Self::drop_client) is served again.
pub(crate) struct TestBroker {
    url: Url,
    received: mpsc::UnboundedReceiver<String>,
    control: mpsc::UnboundedSender<BrokerControl>,
    accepted: Arc<AtomicUsize>,
}

impl TestBroker {
    /// Binds to an ephemeral port and starts serving.
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let url = Url::parse(&format!("ws://127.0.0.1:{port}")).expect("url");

        let (received_tx, received) = mpsc::unbounded_channel();
        let (control, mut control_rx) = mpsc::unbounded_channel();
        let accepted = Arc::new(AtomicUsize::new(0));
        let accepted_count = Arc::clone(&accepted);

        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                    continue;
                };
                accepted_count.fetch_add(1, Ordering::SeqCst);

                loop {
                    tokio::select! {
                        message = ws.next() => match message {
                            Some(Ok(Message::Text(text))) => {
                                let _ = received_tx.send(text.as_str().to_string());
                            }
                            Some(Ok(_)) => {}
                            _ => break,
                        },

                        command = control_rx.recv() => match command {
                            Some(BrokerControl::Send(text)) => {
                                let _ = ws.send(Message::Text(text.into())).await;
                            }
                            Some(BrokerControl::DropClient) => {
                                let _ = ws.close(None).await;
                                break;
                            }
                            None => return,
                        },
                    }
                }
            }
        });

        Self {
            url,
            received,
            control,
            accepted,
        }
    }

    /// Returns the broker URL.
    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    /// Waits up to five seconds for the next received text frame.
    pub(crate) async fn recv(&mut self) -> String {
        timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("broker received nothing in time")
            .expect("broker task ended")
    }

    /// Sends a text frame to the connected client.
    pub(crate) fn send(&self, text: &str) {
        let _ = self.control.send(BrokerControl::Send(text.to_string()));
    }

    /// Closes the connected client's socket.
    pub(crate) fn drop_client(&self) {
        let _ = self.control.send(BrokerControl::DropClient);
    }

    /// Returns how many clients completed the handshake.
    pub(crate) fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

// ============================================================================
// RefusingConnector
// ============================================================================

/// Connector that always fails, counting attempts.
#[derive(Debug, Clone, Default)]
pub(crate) struct RefusingConnector {
    attempts: Arc<AtomicUsize>,
}

impl RefusingConnector {
    /// Returns how many connects were attempted.
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for RefusingConnector {
    async fn connect(&self, url: &Url) -> Result<TransportSocket> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::connection(format!("{url} refused")))
    }

    fn name(&self) -> &'static str {
        "refusing"
    }
}
