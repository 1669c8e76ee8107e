//! The session: one control connection and everything it owns.
//!
//! # Concurrency model (for beginners)
//!
//! A `Session` is shared (behind an `Arc`) by the connect task, the location
//! poller, and any number of callers sending commands.  Two locks split the
//! mutable state:
//!
//! ```text
//!  link:   tokio::sync::Mutex<Option<Box<dyn FrontendLink>>>
//!          held for a whole command exchange (write + read); a second
//!          caller waits here, so bytes of two commands never interleave.
//!
//!  shared: std::sync::Mutex<SessionShared>
//!          status, endpoint, location snapshot, generation counter;
//!          only held for a few field writes and never across `.await`.
//! ```
//!
//! Lock order is always `link` first, then `shared`.
//!
//! # Connect generations
//!
//! Every `connect()` and `disconnect()` bumps a generation counter.  A connect
//! task remembers the generation it was started with; if the counter moved on
//! while the TCP handshake was running, the task closes the link it just
//! opened and reports [`SessionError::Superseded`] instead of touching the
//! status.  This is how a slow, abandoned attempt is kept from overwriting a
//! newer one.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use mythremote_core::{
    FrontendEndpoint, LocationSnapshot, ProtocolError, SessionState, SessionStatus,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::notify::{Notifier, SessionEvent, SessionListener};

/// How long a read waits for more output before the response is cut short.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(2000);

/// How long DNS resolution plus the TCP handshake may take.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Timeouts applied to every link a session opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure on an established link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Reading or writing the socket failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The frontend closed the connection.
    #[error("connection closed by frontend")]
    Closed,
    /// The frontend sent output the codec could not frame.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Failure while opening a link.
///
/// The display text is used verbatim as the `Error` status message.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Unknown host: {address}")]
    HostUnresolvable { address: String },

    #[error("I/O error: {source}: {address}")]
    Io {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Connection timed out: {address}")]
    Timeout { address: String },
}

/// Errors reported by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session is not in the `Connected` state; nothing was sent.
    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// The exchange failed at the transport level and the session was torn down.
    #[error("{source}: {address}")]
    Link {
        address: String,
        #[source]
        source: LinkError,
    },

    /// The frontend answered, but not with the `OK` acknowledgement.
    #[error("unexpected acknowledgement for `{command}`: {}", .response.as_deref().unwrap_or("<no response>"))]
    UnexpectedAcknowledgement {
        command: String,
        response: Option<String>,
    },

    /// A newer `connect()` or a `disconnect()` replaced this connect attempt.
    #[error("connect attempt superseded")]
    Superseded,
}

// ── Seams ─────────────────────────────────────────────────────────────────────

/// One established connection to a frontend.
///
/// Implemented over TCP by the infrastructure layer; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrontendLink: Send {
    /// Discards output left over from an earlier exchange.
    ///
    /// Returns the number of stale lines thrown away.
    async fn drain_stale(&mut self) -> Result<usize, LinkError>;

    /// Writes one command line and flushes it.
    async fn send_line(&mut self, line: &str) -> Result<(), LinkError>;

    /// Reads lines until the prompt, or until the read timeout expires.
    ///
    /// A timeout is not an error: the lines read so far are returned.
    async fn read_response(&mut self) -> Result<Vec<String>, LinkError>;

    /// Releases the streams and the socket.  Close failures are only logged.
    async fn close(&mut self);
}

/// Opens links to frontends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkConnector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &FrontendEndpoint,
    ) -> Result<Box<dyn FrontendLink>, ConnectError>;
}

// ── Session ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SessionShared {
    status: SessionStatus,
    endpoint: Option<FrontendEndpoint>,
    location: LocationSnapshot,
    generation: u64,
}

/// Owns the connection to one frontend at a time.
pub struct Session {
    connector: Arc<dyn LinkConnector>,
    link: Mutex<Option<Box<dyn FrontendLink>>>,
    shared: StdMutex<SessionShared>,
    notifier: Notifier,
}

impl Session {
    /// Creates a disconnected session.
    ///
    /// Must be called from within a Tokio runtime (the notifier spawns its
    /// delivery task here).
    pub fn new(connector: Arc<dyn LinkConnector>) -> Arc<Self> {
        Arc::new(Self {
            connector,
            link: Mutex::new(None),
            shared: StdMutex::new(SessionShared::default()),
            notifier: Notifier::spawn(),
        })
    }

    /// Registers the listener for status and location events.
    pub fn set_listener(&self, listener: Arc<dyn SessionListener>) {
        self.notifier.set_listener(listener);
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Starts connecting to `endpoint`.
    ///
    /// The state becomes `Connecting` before this returns; the handshake runs
    /// on a spawned task whose handle is returned.  Any existing link is
    /// closed by that task before the new one is opened.
    pub fn connect(
        self: &Arc<Self>,
        endpoint: FrontendEndpoint,
    ) -> JoinHandle<Result<(), SessionError>> {
        let generation = {
            let mut shared = self.lock_shared();
            shared.generation += 1;
            shared.endpoint = Some(endpoint.clone());
            shared.location.reset();
            self.set_status(&mut shared, SessionState::Connecting, "Connecting".to_string());
            shared.generation
        };

        info!("connecting to {endpoint}");
        let this = Arc::clone(self);
        tokio::spawn(async move { this.complete_connect(generation, endpoint).await })
    }

    async fn complete_connect(
        &self,
        generation: u64,
        endpoint: FrontendEndpoint,
    ) -> Result<(), SessionError> {
        // Release the previous connection, if any.  It may have been serving
        // an exchange, so this waits for that exchange to finish.
        {
            let mut link = self.link.lock().await;
            if let Some(mut old) = link.take() {
                if let Err(e) = old.send_line("exit").await {
                    debug!("exit on replaced link failed: {e}");
                }
                old.close().await;
            }
        }

        if !self.is_current(generation) {
            debug!("connect to {endpoint} superseded before dialing");
            return Err(SessionError::Superseded);
        }

        let result = self.connector.connect(&endpoint).await;

        let mut link = self.link.lock().await;
        let stale_link = {
            let mut shared = self.lock_shared();
            if shared.generation == generation {
                return match result {
                    Ok(new_link) => {
                        *link = Some(new_link);
                        info!("connected to {endpoint}");
                        let message = endpoint.connected_message();
                        self.set_status(&mut shared, SessionState::Connected, message);
                        Ok(())
                    }
                    Err(e) => {
                        warn!("connect to {endpoint} failed: {e}");
                        self.set_status(&mut shared, SessionState::Error, e.to_string());
                        Err(e.into())
                    }
                };
            }
            result.ok()
        };

        if let Some(mut stale) = stale_link {
            stale.close().await;
        }
        debug!("connect to {endpoint} superseded");
        Err(SessionError::Superseded)
    }

    /// Tears the connection down and forces the `Disconnected` state.
    ///
    /// Idempotent.  Waits for an in-flight exchange to complete first.  When
    /// a link is up, `exit` is sent on a best-effort basis before closing.
    pub async fn disconnect(&self) {
        let mut link = self.link.lock().await;

        let was_connected = {
            let mut shared = self.lock_shared();
            shared.generation += 1;
            shared.location.reset();
            shared.status.state == SessionState::Connected
        };

        if let Some(mut current) = link.take() {
            if was_connected {
                if let Err(e) = current.send_line("exit").await {
                    debug!("exit failed during disconnect: {e}");
                }
            }
            current.close().await;
            info!("disconnected");
        }

        let mut shared = self.lock_shared();
        let status = SessionStatus::disconnected();
        self.set_status(&mut shared, status.state, status.message);
    }

    // ── Exchanges ─────────────────────────────────────────────────────────────

    /// Sends `line` and returns the response lines.
    ///
    /// Only one exchange runs at a time.  A transport failure moves the
    /// session to `Error`, tears the link down, and then settles on
    /// `Disconnected`.
    pub async fn exchange(&self, line: &str) -> Result<Vec<String>, SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }

        let mut guard = self.link.lock().await;
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let Some(link) = guard.as_mut() else {
            return Err(SessionError::NotConnected);
        };

        match run_exchange(link.as_mut(), line).await {
            Ok(lines) => {
                debug!("`{line}` -> {} line(s)", lines.len());
                Ok(lines)
            }
            Err(source) => {
                let address = {
                    let mut shared = self.lock_shared();
                    let address = shared
                        .endpoint
                        .as_ref()
                        .map(|e| e.address.clone())
                        .unwrap_or_default();
                    error!("`{line}` failed on {address}: {source}");
                    shared.generation += 1;
                    shared.location.reset();
                    self.set_status(&mut shared, SessionState::Error, format!("{source}: {address}"));
                    address
                };

                if let Some(mut broken) = guard.take() {
                    broken.close().await;
                }

                let mut shared = self.lock_shared();
                let status = SessionStatus::disconnected();
                self.set_status(&mut shared, status.state, status.message);

                Err(SessionError::Link { address, source })
            }
        }
    }

    // ── Status ────────────────────────────────────────────────────────────────

    /// Records a polled location; emits `LocationChanged` when it differs
    /// from the previous one.  Ignored unless connected.
    pub fn update_location(&self, location: &str) {
        let mut shared = self.lock_shared();
        if shared.status.state != SessionState::Connected {
            return;
        }
        if shared.location.observe(location) {
            debug!("location changed: {location}");
            self.notifier.emit(SessionEvent::LocationChanged {
                location: location.to_string(),
            });
        }
    }

    /// Restores the `"<name> - Connected"` message while connected.
    pub fn refresh_connected_status(&self) {
        let mut shared = self.lock_shared();
        if shared.status.state != SessionState::Connected {
            return;
        }
        if let Some(message) = shared.endpoint.as_ref().map(FrontendEndpoint::connected_message) {
            self.set_status(&mut shared, SessionState::Connected, message);
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.lock_shared().status.clone()
    }

    pub fn status_text(&self) -> String {
        self.lock_shared().status.message.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.lock_shared().status.state == SessionState::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.lock_shared().status.state == SessionState::Connecting
    }

    /// The endpoint of the current (or last) connect attempt.
    pub fn endpoint(&self) -> Option<FrontendEndpoint> {
        self.lock_shared().endpoint.clone()
    }

    /// The last polled location; empty when none has been seen since connecting.
    pub fn location(&self) -> String {
        self.lock_shared().location.current().to_string()
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn lock_shared(&self) -> MutexGuard<'_, SessionShared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock_shared().generation == generation
    }

    /// Writes the status and queues a `StatusChanged` event.
    ///
    /// Must be called with the `shared` guard held so events are queued in
    /// transition order.  A write that changes neither state nor message is
    /// not a transition and emits nothing.
    fn set_status(&self, shared: &mut SessionShared, state: SessionState, message: String) {
        if shared.status.state == state && shared.status.message == message {
            return;
        }
        debug!("status {} -> {state}: {message}", shared.status.state);
        shared.status = SessionStatus::new(state, message.clone());
        self.notifier.emit(SessionEvent::StatusChanged { message, state });
    }
}

async fn run_exchange(link: &mut dyn FrontendLink, line: &str) -> Result<Vec<String>, LinkError> {
    let stale = link.drain_stale().await?;
    if stale > 0 {
        debug!("discarded {stale} stale line(s) before `{line}`");
    }
    link.send_line(line).await?;
    link.read_response().await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
