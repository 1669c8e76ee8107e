//! TCP transport for the frontend control port.
//!
//! Architecture:
//! - [`TcpConnector`] resolves the endpoint, dials it under the connect
//!   timeout, and wraps the stream in a [`TcpFrontendLink`].
//! - [`TcpFrontendLink`] owns both halves of the stream plus a receive
//!   buffer.  Bytes are appended to the buffer as they arrive and frames are
//!   cut off the front with [`decode_frame`] until a prompt completes the
//!   response.
//!
//! A read that waits longer than the read timeout ends the response early
//! with whatever lines were already decoded.  Whatever arrives after that is
//! picked up by the next exchange's [`drain_stale`](FrontendLink::drain_stale).

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use mythremote_core::{decode_frame, FrontendEndpoint, Frame, ProtocolError};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time,
};
use tracing::{debug, info, warn};

use crate::application::session::{
    ConnectError, FrontendLink, LinkConnector, LinkError, SessionConfig,
};

const READ_CHUNK: usize = 4096;

/// Opens TCP links to frontends.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    config: SessionConfig,
}

impl TcpConnector {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LinkConnector for TcpConnector {
    async fn connect(
        &self,
        endpoint: &FrontendEndpoint,
    ) -> Result<Box<dyn FrontendLink>, ConnectError> {
        let address = endpoint.address.clone();

        let dial = async {
            let peer = resolve(&address, endpoint.port).await?;
            debug!("resolved {address} to {peer}");
            TcpStream::connect(peer)
                .await
                .map(|stream| (stream, peer))
                .map_err(|source| ConnectError::Io {
                    address: address.clone(),
                    source,
                })
        };

        let (stream, peer) = time::timeout(self.config.connect_timeout, dial)
            .await
            .map_err(|_| ConnectError::Timeout {
                address: address.clone(),
            })??;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not set TCP_NODELAY on {peer}: {e}");
        }
        info!("TCP connection to {peer} established");
        Ok(Box::new(TcpFrontendLink::new(stream, peer, self.config.read_timeout)))
    }
}

async fn resolve(address: &str, port: u16) -> Result<SocketAddr, ConnectError> {
    let unresolvable = || ConnectError::HostUnresolvable {
        address: address.to_string(),
    };
    let mut candidates = tokio::net::lookup_host((address, port)).await.map_err(|e| {
        debug!("lookup of {address} failed: {e}");
        unresolvable()
    })?;
    candidates.next().ok_or_else(unresolvable)
}

/// One TCP connection to a frontend.
pub struct TcpFrontendLink {
    read_half: OwnedReadHalf,
    write_half: OwnedWriteHalf,
    /// Received bytes not yet consumed by the decoder.
    pending: Vec<u8>,
    read_timeout: Duration,
    peer: SocketAddr,
}

impl TcpFrontendLink {
    pub fn new(stream: TcpStream, peer: SocketAddr, read_timeout: Duration) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            read_half,
            write_half,
            pending: Vec::with_capacity(READ_CHUNK),
            read_timeout,
            peer,
        }
    }

    /// Pulls every complete frame out of `pending`.
    ///
    /// Returns `true` once a prompt has been consumed.
    fn decode_pending(&mut self, lines: &mut Vec<String>) -> Result<bool, LinkError> {
        loop {
            match decode_frame(&self.pending) {
                Ok((Frame::Line(line), used)) => {
                    lines.push(line);
                    self.pending.drain(..used);
                }
                Ok((Frame::Prompt, used)) => {
                    self.pending.drain(..used);
                    return Ok(true);
                }
                Err(ProtocolError::InsufficientData { .. }) => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Appends whatever is readable right now without waiting.
    ///
    /// Returns the number of bytes read; `Ok(0)` means nothing was waiting.
    fn read_ready(&mut self) -> Result<usize, LinkError> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.read_half.try_read(&mut chunk) {
            Ok(0) => Err(LinkError::Closed),
            Ok(n) => {
                self.pending.extend_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl FrontendLink for TcpFrontendLink {
    async fn drain_stale(&mut self) -> Result<usize, LinkError> {
        if self.pending.is_empty() && self.read_ready()? == 0 {
            return Ok(0);
        }
        let stale = self.read_response().await?;
        debug!("drained {} stale line(s) from {}", stale.len(), self.peer);
        Ok(stale.len())
    }

    async fn send_line(&mut self, line: &str) -> Result<(), LinkError> {
        let bytes = mythremote_core::encode_command(line);
        self.write_half.write_all(&bytes).await?;
        self.write_half.flush().await?;
        debug!("sent `{line}` to {}", self.peer);
        Ok(())
    }

    async fn read_response(&mut self) -> Result<Vec<String>, LinkError> {
        let mut lines = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if self.decode_pending(&mut lines)? {
                return Ok(lines);
            }

            match time::timeout(self.read_timeout, self.read_half.read(&mut chunk)).await {
                Ok(Ok(0)) => return Err(LinkError::Closed),
                Ok(Ok(n)) => self.pending.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    warn!(
                        "no prompt from {} within {} ms; returning {} line(s)",
                        self.peer,
                        self.read_timeout.as_millis(),
                        lines.len()
                    );
                    return Ok(lines);
                }
            }
        }
    }

    async fn close(&mut self) {
        self.pending.clear();
        if let Err(e) = self.write_half.shutdown().await {
            warn!("closing stream to {} failed: {e}", self.peer);
        }
        debug!("link to {} closed", self.peer);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
