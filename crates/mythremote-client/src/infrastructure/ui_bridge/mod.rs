//! Bridge between the session and whatever UI sits on top of it.
//!
//! The session reports changes through the [`SessionListener`] trait.  UI
//! code usually prefers a stream of values it can `select!` on or forward
//! over IPC, so this module adapts the trait to a Tokio channel:
//!
//! ```text
//! Notifier task ──> ChannelListener ──> mpsc ──> UI loop
//!                   (SessionListener)            recv().await
//! ```
//!
//! # DTOs
//!
//! [`SessionEvent`] and [`StatusDto`] derive `serde::Serialize` so a UI
//! running in another process (or a WebView) can receive them as JSON:
//!
//! ```json
//! { "event": "status_changed", "message": "Den - Connected", "state": "Connected" }
//! { "event": "location_changed", "location": "mainmenu" }
//! ```

use std::sync::Arc;

use mythremote_core::{FrontendLocation, SessionState, SessionStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::notify::SessionListener;

pub use crate::application::notify::SessionEvent;

/// A [`SessionListener`] that forwards every callback into a channel.
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelListener {
    /// Returns the listener (ready for `set_listener`) and the receiving end.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }

    fn forward(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("UI receiver dropped; session event discarded");
        }
    }
}

impl SessionListener for ChannelListener {
    fn on_status_changed(&self, message: &str, state: SessionState) {
        self.forward(SessionEvent::StatusChanged {
            message: message.to_string(),
            state,
        });
    }

    fn on_location_changed(&self, location: &str) {
        self.forward(SessionEvent::LocationChanged {
            location: location.to_string(),
        });
    }
}

/// Serializable status snapshot for UI display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDto {
    pub state: SessionState,
    /// Numeric status code (0, 1, 3 or 99).
    pub code: i32,
    pub message: String,
    /// Typed view of the last polled location, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<FrontendLocation>,
}

impl StatusDto {
    pub fn new(status: &SessionStatus, location: &str) -> Self {
        Self {
            state: status.state,
            code: status.state.code(),
            message: status.message.clone(),
            location: (!location.is_empty()).then(|| FrontendLocation::parse(location)),
        }
    }

    /// Single-line JSON form, as printed by `status json`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_listener_forwards_callbacks_in_order() {
        // Arrange
        let (listener, mut rx) = ChannelListener::new();

        // Act
        listener.on_status_changed("Connecting", SessionState::Connecting);
        listener.on_location_changed("mainmenu");

        // Assert
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::StatusChanged {
                message: "Connecting".into(),
                state: SessionState::Connecting
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::LocationChanged {
                location: "mainmenu".into()
            })
        );
    }

    #[test]
    fn test_channel_listener_tolerates_dropped_receiver() {
        let (listener, rx) = ChannelListener::new();
        drop(rx);
        listener.on_location_changed("mainmenu");
    }

    #[test]
    fn test_session_event_json_is_tagged() {
        let event = SessionEvent::StatusChanged {
            message: "Den - Connected".into(),
            state: SessionState::Connected,
        };

        let json = serde_json::to_value(&event).expect("serialize");

        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["state"], "Connected");
        assert_eq!(json["message"], "Den - Connected");
    }

    #[test]
    fn test_status_dto_includes_code_and_location() {
        let status = SessionStatus::new(SessionState::Connected, "Den - Connected");

        let dto = StatusDto::new(&status, "Playback Video 00:01:00 1x");
        let json = dto.to_json().expect("serialize");

        assert_eq!(dto.code, 1);
        assert_eq!(
            dto.location,
            Some(FrontendLocation::PlaybackVideo {
                position: "00:01:00".into()
            })
        );
        assert!(json.contains("\"code\":1"));
    }

    #[test]
    fn test_status_dto_without_location_omits_field() {
        let dto = StatusDto::new(&SessionStatus::disconnected(), "");
        let json = dto.to_json().expect("serialize");
        assert!(!json.contains("location"));
        assert_eq!(dto.code, 0);
    }
}
