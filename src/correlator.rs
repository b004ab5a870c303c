//! Acknowledgment correlator.
//!
//! Classifies inbound control-channel traffic by topic substring and fans it
//! out to observers:
//!
//! | Topic contains | Observer method |
//! |----------------|-----------------|
//! | `/ack` | `on_ack` |
//! | `/status/` | `on_status` |
//! | anything | `on_message` |
//!
//! A topic may match both markers. Every message reaches `on_message`
//! regardless of classification, and parsing never fails.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::trace;

use crate::observer::ObserverRegistry;
use crate::protocol::InboundMessage;

// ============================================================================
// Classification
// ============================================================================

/// Categories an inbound message belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    /// Topic carries the acknowledgment marker.
    pub ack: bool,
    /// Topic carries the status marker.
    pub status: bool,
}

impl Classification {
    /// Classifies a message.
    #[inline]
    #[must_use]
    pub fn of(message: &InboundMessage) -> Self {
        Self {
            ack: message.is_ack(),
            status: message.is_status(),
        }
    }

    /// Returns `true` if the message is neither an ack nor a status update.
    #[inline]
    #[must_use]
    pub fn is_generic(self) -> bool {
        !self.ack && !self.status
    }
}

// ============================================================================
// Correlator
// ============================================================================

/// Routes inbound messages to observers.
pub struct Correlator {
    observers: Arc<ObserverRegistry>,
}

impl Correlator {
    /// Creates a correlator notifying `observers`.
    #[inline]
    #[must_use]
    pub fn new(observers: Arc<ObserverRegistry>) -> Self {
        Self { observers }
    }

    /// Returns the observer registry.
    #[inline]
    #[must_use]
    pub fn observers(&self) -> &Arc<ObserverRegistry> {
        &self.observers
    }

    /// Parses a raw text frame and dispatches it.
    pub fn handle_text(&self, text: &str) -> Classification {
        self.dispatch(&InboundMessage::parse(text))
    }

    /// Dispatches a parsed message.
    ///
    /// Ack observers run first, then status observers, then generic ones.
    pub fn dispatch(&self, message: &InboundMessage) -> Classification {
        let class = Classification::of(message);

        trace!(
            topic = %message.topic,
            ack = class.ack,
            status = class.status,
            "Inbound message"
        );

        if class.ack {
            self.observers.notify(|o| o.on_ack(message));
        }
        if class.status {
            self.observers.notify(|o| o.on_status(message));
        }
        self.observers.notify(|o| o.on_message(message));

        class
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use proptest::prelude::*;

    use crate::observer::LinkObserver;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl LinkObserver for Recorder {
        fn on_message(&self, message: &InboundMessage) {
            self.events.lock().push(format!("message:{}", message.topic));
        }

        fn on_ack(&self, ack: &InboundMessage) {
            self.events.lock().push(format!("ack:{}", ack.topic));
        }

        fn on_status(&self, status: &InboundMessage) {
            self.events.lock().push(format!("status:{}", status.topic));
        }
    }

    fn setup() -> (Correlator, Arc<Recorder>) {
        let registry = Arc::new(ObserverRegistry::new());
        let recorder = Arc::new(Recorder::default());
        registry.add(recorder.clone());
        (Correlator::new(registry), recorder)
    }

    #[test]
    fn test_ack_routed_and_forwarded() {
        let (correlator, recorder) = setup();
        let class = correlator.handle_text(r#"{"topic":"forklift/control/ack","payload":"tilt_up"}"#);

        assert!(class.ack);
        assert!(!class.status);
        assert_eq!(
            *recorder.events.lock(),
            vec!["ack:forklift/control/ack", "message:forklift/control/ack"]
        );
    }

    #[test]
    fn test_status_routed_and_forwarded() {
        let (correlator, recorder) = setup();
        correlator.handle_text("forklift/status/cam1:{\"zoom\":2}");

        assert_eq!(
            *recorder.events.lock(),
            vec!["status:forklift/status/cam1", "message:forklift/status/cam1"]
        );
    }

    #[test]
    fn test_generic_message() {
        let (correlator, recorder) = setup();
        let class = correlator.handle_text("forklift/telemetry:42");

        assert!(class.is_generic());
        assert_eq!(*recorder.events.lock(), vec!["message:forklift/telemetry"]);
    }

    #[test]
    fn test_both_markers() {
        let (correlator, recorder) = setup();
        correlator.handle_text("rig/ack/status/cam:ok");

        assert_eq!(recorder.events.lock().len(), 3);
    }

    #[test]
    fn test_malformed_never_dropped() {
        let (correlator, recorder) = setup();
        correlator.handle_text("{not json");
        correlator.handle_text("");

        assert_eq!(recorder.events.lock().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_every_message_forwarded(text in ".*") {
            let (correlator, recorder) = setup();
            let class = correlator.handle_text(&text);

            let events = recorder.events.lock();
            let expected = 1 + usize::from(class.ack) + usize::from(class.status);
            prop_assert_eq!(events.len(), expected);
            prop_assert!(events.last().is_some_and(|e| e.starts_with("message:")));
        }
    }
}
