//! RemoteControl: the facade a UI layer drives.
//!
//! Bundles one [`Session`], its [`CommandDispatcher`] and its
//! [`LocationPoller`].  The poller is (re-)armed whenever a connect succeeds
//! or the interval changes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mythremote_core::{FrontendEndpoint, SessionStatus};
use tokio::task::JoinHandle;
use tracing::debug;

use super::dispatch_command::CommandDispatcher;
use super::notify::SessionListener;
use super::poll_location::{interval_from_ms, LocationPoller};
use super::session::{LinkConnector, Session, SessionError};

/// Default period between two `query location` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

pub struct RemoteControl {
    session: Arc<Session>,
    dispatcher: CommandDispatcher,
    poller: Arc<LocationPoller>,
    poll_interval: Arc<Mutex<Duration>>,
}

impl RemoteControl {
    /// Creates a disconnected remote control that opens links through
    /// `connector` (the TCP connector in production).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(connector: Arc<dyn LinkConnector>, poll_interval: Duration) -> Self {
        let session = Session::new(connector);
        let dispatcher = CommandDispatcher::new(Arc::clone(&session));
        let poller = Arc::new(LocationPoller::new(dispatcher.clone()));
        Self {
            session,
            dispatcher,
            poller,
            poll_interval: Arc::new(Mutex::new(poll_interval)),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Starts connecting; the state is `Connecting` when this returns.
    ///
    /// Polling is armed once the returned task reports success.
    pub fn connect(&self, endpoint: FrontendEndpoint) -> JoinHandle<Result<(), SessionError>> {
        let attempt = self.session.connect(endpoint);
        let poller = Arc::clone(&self.poller);
        let poll_interval = Arc::clone(&self.poll_interval);

        tokio::spawn(async move {
            let result = match attempt.await {
                Ok(result) => result,
                Err(join_error) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic())
                }
                Err(join_error) => {
                    debug!("connect task cancelled: {join_error}");
                    Err(SessionError::Superseded)
                }
            };
            if result.is_ok() {
                let period = *poll_interval.lock().unwrap_or_else(|p| p.into_inner());
                poller.set_interval(period);
            }
            result
        })
    }

    /// Stops polling and disconnects.  Idempotent.
    pub async fn disconnect(&self) {
        self.poller.stop();
        self.session.disconnect().await;
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    pub async fn execute(
        &self,
        command: &str,
        expect_ack: bool,
    ) -> Result<Vec<String>, SessionError> {
        self.dispatcher.execute(command, expect_ack).await
    }

    pub async fn send_jump(&self, location: &str) -> Result<(), SessionError> {
        self.dispatcher.send_jump(location).await
    }

    pub async fn send_key(&self, token: &str) -> Result<(), SessionError> {
        self.dispatcher.send_key(token).await
    }

    pub async fn send_play(&self, subcommand: &str) -> Result<(), SessionError> {
        self.dispatcher.send_play(subcommand).await
    }

    pub async fn send_text(&self, text: &str) -> Result<(), SessionError> {
        self.dispatcher.send_text(text).await
    }

    pub async fn volume_up(&self) -> Result<(), SessionError> {
        self.dispatcher.volume_up().await
    }

    pub async fn volume_down(&self) -> Result<(), SessionError> {
        self.dispatcher.volume_down().await
    }

    pub async fn query(&self, name: &str) -> Result<Vec<String>, SessionError> {
        self.dispatcher.query(name).await
    }

    // ── Status ────────────────────────────────────────────────────────────────

    pub fn set_listener(&self, listener: Arc<dyn SessionListener>) {
        self.session.set_listener(listener);
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.session.is_connecting()
    }

    pub fn status_text(&self) -> String {
        self.session.status_text()
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    // ── Polling ───────────────────────────────────────────────────────────────

    /// Changes the poll period and re-arms the poller.  Zero disables polling.
    pub fn set_poll_interval(&self, period: Duration) {
        *self.poll_interval.lock().unwrap_or_else(|p| p.into_inner()) = period;
        self.poller.set_interval(period);
    }

    /// Millisecond variant of [`set_poll_interval`](Self::set_poll_interval);
    /// zero or negative disables polling.
    pub fn set_poll_interval_ms(&self, interval_ms: i64) {
        self.set_poll_interval(interval_from_ms(interval_ms));
    }

    pub fn poll_interval(&self) -> Duration {
        *self.poll_interval.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }
}
