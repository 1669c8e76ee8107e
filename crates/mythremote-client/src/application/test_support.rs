//! In-memory frontend used by the application-layer unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mythremote_core::{FrontendEndpoint, SessionState};
use tokio::sync::mpsc;

use super::notify::{SessionEvent, SessionListener};
use super::session::{ConnectError, FrontendLink, LinkConnector, LinkError, Session};

/// Listener that queues every event for the test to inspect.
pub(crate) struct RecordingListener {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl RecordingListener {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl SessionListener for RecordingListener {
    fn on_status_changed(&self, message: &str, state: SessionState) {
        let _ = self.tx.send(SessionEvent::StatusChanged {
            message: message.to_string(),
            state,
        });
    }

    fn on_location_changed(&self, location: &str) {
        let _ = self.tx.send(SessionEvent::LocationChanged {
            location: location.to_string(),
        });
    }
}

/// Scripted frontend state shared by every link it hands out.
#[derive(Clone, Default)]
pub(crate) struct FakeFrontend {
    sent: Arc<Mutex<Vec<String>>>,
    location: Arc<Mutex<String>>,
    ack: Arc<Mutex<String>>,
    fail_writes: Arc<AtomicBool>,
    reply_delay: Arc<Mutex<Duration>>,
}

impl FakeFrontend {
    pub(crate) fn new(location: &str) -> Self {
        let frontend = Self::default();
        frontend.set_location(location);
        frontend.set_ack("OK");
        frontend
    }

    pub(crate) fn set_location(&self, location: &str) {
        *self.location.lock().unwrap() = location.to_string();
    }

    /// First line sent back for `jump`, `key` and `play`.
    pub(crate) fn set_ack(&self, ack: &str) {
        *self.ack.lock().unwrap() = ack.to_string();
    }

    /// Every response is held back this long after the command arrives.
    pub(crate) fn set_reply_delay(&self, delay: Duration) {
        *self.reply_delay.lock().unwrap() = delay;
    }

    pub(crate) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Every command line received, in order.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn location_queries(&self) -> usize {
        self.sent()
            .iter()
            .filter(|line| line.as_str() == "query location")
            .count()
    }

    /// A session already connected to this frontend as "Den".
    pub(crate) async fn connected_session(&self) -> Arc<Session> {
        let session = Session::new(Arc::new(FakeConnector(self.clone())));
        session
            .connect(FrontendEndpoint::new("Den", "10.0.0.5"))
            .await
            .unwrap()
            .unwrap();
        session
    }
}

struct FakeConnector(FakeFrontend);

#[async_trait]
impl LinkConnector for FakeConnector {
    async fn connect(
        &self,
        _endpoint: &FrontendEndpoint,
    ) -> Result<Box<dyn FrontendLink>, ConnectError> {
        Ok(Box::new(FakeLink {
            frontend: self.0.clone(),
            last: None,
        }))
    }
}

struct FakeLink {
    frontend: FakeFrontend,
    last: Option<String>,
}

#[async_trait]
impl FrontendLink for FakeLink {
    async fn drain_stale(&mut self) -> Result<usize, LinkError> {
        Ok(0)
    }

    async fn send_line(&mut self, line: &str) -> Result<(), LinkError> {
        if self.frontend.fail_writes.load(Ordering::SeqCst) {
            return Err(LinkError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken pipe",
            )));
        }
        self.frontend.sent.lock().unwrap().push(line.to_string());
        self.last = Some(line.to_string());
        Ok(())
    }

    async fn read_response(&mut self) -> Result<Vec<String>, LinkError> {
        let Some(line) = self.last.take() else {
            return Ok(Vec::new());
        };
        let delay = *self.frontend.reply_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let verb = line.split_whitespace().next().unwrap_or_default();
        let reply = match verb {
            "query" if line == "query location" => {
                let location = self.frontend.location.lock().unwrap().clone();
                if location.is_empty() {
                    Vec::new()
                } else {
                    vec![location]
                }
            }
            "jump" | "key" | "play" => {
                let ack = self.frontend.ack.lock().unwrap().clone();
                if ack.is_empty() {
                    Vec::new()
                } else {
                    vec![ack]
                }
            }
            _ => Vec::new(),
        };
        Ok(reply)
    }

    async fn close(&mut self) {}
}
