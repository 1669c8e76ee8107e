//! mythremote-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does mythremote-client do? (for beginners)
//!
//! A MythTV frontend is the box under the TV.  It listens on a plain-text
//! control port; anything that can open a TCP socket can press its keys,
//! jump between screens, and ask where it currently is.
//!
//! This crate keeps one such control connection alive and makes it safe to
//! use from several places at once:
//!
//! 1. `Session` owns the socket and the connection state machine
//!    (Disconnected → Connecting → Connected, or Error).
//! 2. `CommandDispatcher` sends one command at a time and checks the `OK`
//!    acknowledgement.
//! 3. `LocationPoller` asks the frontend `query location` every few seconds
//!    and raises a notification when the answer changes.
//! 4. `Notifier` delivers status and location events, in order, to whatever
//!    UI layer registered a listener.
//!
//! `RemoteControl` bundles all four behind the small interface a UI needs.

/// Application layer: the session, its commands, polling, and notifications.
pub mod application;

/// Infrastructure layer: TCP transport, UI bridge, and configuration.
pub mod infrastructure;

pub use application::remote_control::RemoteControl;
pub use application::session::{Session, SessionConfig, SessionError};
pub use application::notify::{SessionEvent, SessionListener};
pub use infrastructure::ui_bridge::ChannelListener;
