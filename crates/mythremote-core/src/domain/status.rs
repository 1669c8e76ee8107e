//! Session states and the status reported to listeners.
//!
//! # State machine
//!
//! ```text
//!                 connect()
//!  Disconnected ────────────> Connecting
//!       ^                      │      │
//!       │          socket up   │      │ connect failed
//!       │                      v      v
//!       ├──────────────── Connected  Error
//!       │  disconnect() /      │      ^
//!       │  poll failed         └──────┘ I/O failure during a command
//!       │
//!       └──── disconnect() from any state always lands here
//! ```
//!
//! Every state has a numeric code so that listeners written against the
//! legacy integer interface keep working.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No socket.  The initial state, and the state after any teardown.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// Socket and streams are up; commands may be sent.
    Connected,
    /// The last connect attempt or exchange failed.
    Error,
}

impl SessionState {
    /// Numeric status code delivered alongside status messages.
    pub fn code(self) -> i32 {
        match self {
            Self::Disconnected => 0,
            Self::Connected => 1,
            Self::Connecting => 3,
            Self::Error => 99,
        }
    }

    /// Maps a numeric status code back to a state.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Connected),
            3 => Some(Self::Connecting),
            99 => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Error => "Error",
        };
        f.write_str(name)
    }
}

/// A state together with its human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub message: String,
}

impl SessionStatus {
    pub fn new(state: SessionState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }

    /// The status of a session that has never connected.
    pub fn disconnected() -> Self {
        Self::new(SessionState::Disconnected, "Disconnected")
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::disconnected()
    }
}
