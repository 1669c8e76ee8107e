//! Ordered delivery of session events to a single listener.
//!
//! # Why a delivery task? (for beginners)
//!
//! Status changes are produced by three different contexts: the connect task,
//! the poller task, and whichever task called a command.  A UI must see those
//! changes in the order they happened and must never be called while the
//! session holds one of its locks (a listener that calls back into the session
//! would deadlock).
//!
//! The `Notifier` solves both problems with one unbounded channel:
//!
//! ```text
//! connect task ─┐
//! poller task  ─┼─ emit() ──> [ channel ] ──> delivery task ──> listener
//! command call ─┘
//! ```
//!
//! The session enqueues each event *while* it still holds its state lock, so
//! the channel order equals the transition order.  The delivery task is the
//! only code that ever calls the listener.
//!
//! Registering a listener travels through the same channel, so a listener
//! set before `connect()` is guaranteed to see the `Connecting` event.

use std::sync::Arc;

use mythremote_core::SessionState;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// A tagged session notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session moved to a new state or changed its status message.
    StatusChanged { message: String, state: SessionState },
    /// The frontend reported a location different from the previous poll.
    LocationChanged { location: String },
}

impl SessionEvent {
    /// Numeric status code for `StatusChanged` events.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::StatusChanged { state, .. } => Some(state.code()),
            Self::LocationChanged { .. } => None,
        }
    }
}

/// Observer interface for UI layers.
///
/// Both methods are called from the notifier's delivery task, one event at a
/// time, in transition order.
pub trait SessionListener: Send + Sync {
    fn on_status_changed(&self, message: &str, state: SessionState);
    fn on_location_changed(&self, location: &str);
}

enum Delivery {
    Listen(Option<Arc<dyn SessionListener>>),
    Event(SessionEvent),
}

/// Handle used by the session to publish events.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl Notifier {
    /// Spawns the delivery task.
    ///
    /// Must be called from within a Tokio runtime.  The task ends once every
    /// `Notifier` clone has been dropped.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(deliver_events(rx));
        Self { tx }
    }

    /// Registers `listener`, replacing any previous one.
    pub fn set_listener(&self, listener: Arc<dyn SessionListener>) {
        self.send(Delivery::Listen(Some(listener)));
    }

    /// Removes the current listener; later events are dropped.
    pub fn clear_listener(&self) {
        self.send(Delivery::Listen(None));
    }

    /// Queues `event` for delivery.
    pub fn emit(&self, event: SessionEvent) {
        self.send(Delivery::Event(event));
    }

    fn send(&self, delivery: Delivery) {
        if self.tx.send(delivery).is_err() {
            debug!("notifier delivery task has stopped; event dropped");
        }
    }
}

async fn deliver_events(mut rx: mpsc::UnboundedReceiver<Delivery>) {
    let mut listener: Option<Arc<dyn SessionListener>> = None;

    while let Some(delivery) = rx.recv().await {
        match delivery {
            Delivery::Listen(next) => listener = next,
            Delivery::Event(event) => {
                let Some(l) = listener.as_ref() else {
                    continue;
                };
                match &event {
                    SessionEvent::StatusChanged { message, state } => {
                        l.on_status_changed(message, *state)
                    }
                    SessionEvent::LocationChanged { location } => l.on_location_changed(location),
                }
            }
        }
    }

    debug!("notifier delivery task finished");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
