//! State shared between manager handles and the event loop.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use url::Url;
use uuid::Uuid;

use crate::correlator::Correlator;
use crate::observer::ObserverRegistry;
use crate::transport::Connector;

use super::options::LinkOptions;
use super::state::{ConnectionStatus, LinkState};

// ============================================================================
// Shared
// ============================================================================

/// Everything one link owns besides the socket.
pub(crate) struct Shared {
    /// Link identifier for logs.
    pub(crate) id: Uuid,
    /// Broker URL.
    pub(crate) url: Url,
    /// Immutable configuration.
    pub(crate) options: LinkOptions,
    /// Socket factory.
    pub(crate) connector: Arc<dyn Connector>,
    /// Inbound routing and the observer registry.
    pub(crate) correlator: Correlator,
    /// Connection state, pending queue and subscriptions.
    state: Mutex<LinkState>,
    /// Status broadcast.
    status_tx: watch::Sender<ConnectionStatus>,
}

impl Shared {
    /// Creates disconnected shared state.
    pub(crate) fn new(url: Url, options: LinkOptions, connector: Arc<dyn Connector>) -> Self {
        let state = LinkState::new(options.max_pending);
        let (status_tx, _) = watch::channel(state.status());

        Self {
            id: Uuid::new_v4(),
            url,
            options,
            connector,
            correlator: Correlator::new(Arc::new(ObserverRegistry::new())),
            state: Mutex::new(state),
            status_tx,
        }
    }

    /// Returns the observer registry.
    #[inline]
    pub(crate) fn observers(&self) -> &ObserverRegistry {
        self.correlator.observers()
    }

    /// Mutates the state and broadcasts the resulting status.
    ///
    /// The broadcast happens under the state lock so watchers never observe
    /// statuses out of order.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut LinkState) -> R) -> R {
        let mut state = self.state.lock();
        let result = f(&mut *state);
        let status = state.status();

        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });

        result
    }

    /// Reads the state.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&LinkState) -> R) -> R {
        f(&*self.state.lock())
    }

    /// Returns a new status receiver.
    pub(crate) fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }
}
