//! A scripted frontend listening on a loopback port.
//!
//! Speaks just enough of the network control protocol for the integration
//! tests: a greeting banner, `OK` for `jump`/`key`/`play`, a configurable
//! answer for `query location`, and a clean hang-up on `exit`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mythremote_client::{RemoteControl, SessionEvent};
use mythremote_core::FrontendEndpoint;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

const BANNER: &[u8] = b"MythFrontend Network Control\r\n\
Type 'help' for usage information\r\n\
---------------------------------\r\n# ";

#[derive(Default)]
struct Script {
    received: Mutex<Vec<String>>,
    location: Mutex<String>,
    hang_up: AtomicBool,
    query_delay: Mutex<Duration>,
}

pub struct FakeFrontendServer {
    pub endpoint: FrontendEndpoint,
    script: Arc<Script>,
    task: JoinHandle<()>,
}

impl FakeFrontendServer {
    /// Starts listening on an ephemeral loopback port.
    pub async fn start(location: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let script = Arc::new(Script::default());
        *script.location.lock().unwrap() = location.to_string();

        let accept_script = Arc::clone(&script);
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve(socket, Arc::clone(&accept_script)));
            }
        });

        Self {
            endpoint: FrontendEndpoint::new("Fake", "127.0.0.1").with_port(port),
            script,
            task,
        }
    }

    /// Every command line received, across all connections.
    pub fn received(&self) -> Vec<String> {
        self.script.received.lock().unwrap().clone()
    }

    pub fn location_queries(&self) -> usize {
        self.received()
            .iter()
            .filter(|line| line.as_str() == "query location")
            .count()
    }

    pub fn set_location(&self, location: &str) {
        *self.script.location.lock().unwrap() = location.to_string();
    }

    /// Holds back every `query` reply this long.
    pub fn set_query_delay(&self, delay: Duration) {
        *self.script.query_delay.lock().unwrap() = delay;
    }

    /// The next command is recorded and then answered by closing the socket.
    pub fn hang_up_on_next_command(&self) {
        self.script.hang_up.store(true, Ordering::SeqCst);
    }
}

impl Drop for FakeFrontendServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(socket: TcpStream, script: Arc<Script>) {
    let (read, mut write) = socket.into_split();
    if write.write_all(BANNER).await.is_err() {
        return;
    }

    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim_end().to_string();
        script.received.lock().unwrap().push(line.clone());

        if script.hang_up.swap(false, Ordering::SeqCst) || line == "exit" {
            return;
        }

        let reply = match line.split_whitespace().next().unwrap_or_default() {
            "jump" | "key" | "play" => "OK\r\n# ".to_string(),
            "query" if line == "query location" => {
                let delay = *script.query_delay.lock().unwrap();
                tokio::time::sleep(delay).await;
                format!("{}\r\n# ", script.location.lock().unwrap())
            }
            _ => "ERROR unknown command\r\n# ".to_string(),
        };
        if write.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Connects and waits until the greeting banner has arrived.
pub async fn connect(remote: &RemoteControl, server: &FakeFrontendServer) {
    remote
        .connect(server.endpoint.clone())
        .await
        .expect("connect task")
        .expect("connect");
    tokio::time::sleep(Duration::from_millis(100)).await;
}

pub async fn next_event(rx: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("event must arrive in time")
        .expect("listener channel open")
}

/// Waits for the next `StatusChanged` event, skipping location events.
pub async fn next_status(rx: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
    loop {
        let event = next_event(rx).await;
        if matches!(event, SessionEvent::StatusChanged { .. }) {
            return event;
        }
    }
}
