//! CommandDispatcher: sends commands and checks acknowledgements.
//!
//! Every command goes through [`Session::exchange`], which serialises access
//! to the link.  On top of that this module adds the `OK` acknowledgement
//! check and the convenience verbs a remote-control UI uses.
//!
//! An acknowledgement mismatch is a *logical* failure: it is reported to the
//! caller and logged, but the connection is left as it is.  Only transport
//! failures tear the session down.

use std::sync::Arc;

use mythremote_core::{
    key_tokens_for_text, FrontendCommand, ACK_TOKEN, KEY_VOLUME_DOWN, KEY_VOLUME_UP,
};
use tracing::{debug, error};

use super::poll_location::check_location;
use super::session::{Session, SessionError};

/// Executes commands against a shared [`Session`].
#[derive(Clone)]
pub struct CommandDispatcher {
    session: Arc<Session>,
}

impl CommandDispatcher {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Sends one raw command line and returns the response lines.
    ///
    /// With `expect_ack`, an empty response or a first line other than `OK`
    /// fails with [`SessionError::UnexpectedAcknowledgement`].
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotConnected`] when the session is not connected
    ///   (nothing is written).
    /// - [`SessionError::Link`] when the exchange failed on the wire; the
    ///   session has already been disconnected.
    pub async fn execute(
        &self,
        command: &str,
        expect_ack: bool,
    ) -> Result<Vec<String>, SessionError> {
        let line = command.strip_suffix('\n').unwrap_or(command);

        let lines = match self.session.exchange(command).await {
            Ok(lines) => lines,
            Err(SessionError::NotConnected) => {
                error!("unable to send `{line}`: not connected");
                return Err(SessionError::NotConnected);
            }
            Err(e) => return Err(e),
        };

        if expect_ack {
            check_ack(line, &lines)?;
        }
        Ok(lines)
    }

    /// Sends a typed command, checking the acknowledgement when the verb has one.
    pub async fn send(&self, command: &FrontendCommand) -> Result<Vec<String>, SessionError> {
        self.execute(&command.to_line(), command.expects_ack()).await
    }

    /// `jump <location>`, then a location re-check.
    pub async fn send_jump(&self, location: &str) -> Result<(), SessionError> {
        self.send_then_recheck(FrontendCommand::Jump(location.to_string()))
            .await
    }

    /// `key <token>`, then a location re-check.
    pub async fn send_key(&self, token: &str) -> Result<(), SessionError> {
        self.send_then_recheck(FrontendCommand::Key(token.to_string()))
            .await
    }

    /// `play <subcommand>`, then a location re-check.
    pub async fn send_play(&self, subcommand: &str) -> Result<(), SessionError> {
        self.send_then_recheck(FrontendCommand::Play(subcommand.to_string()))
            .await
    }

    /// `query <name>`.  Queries never carry an acknowledgement.
    pub async fn query(&self, name: &str) -> Result<Vec<String>, SessionError> {
        self.send(&FrontendCommand::Query(name.to_string())).await
    }

    /// Types `text` as a series of key presses.
    ///
    /// Stops at the first key that fails.  The location is re-checked once
    /// at the end either way.
    pub async fn send_text(&self, text: &str) -> Result<(), SessionError> {
        let mut result = Ok(());
        for token in key_tokens_for_text(text) {
            if let Err(e) = self.send(&FrontendCommand::Key(token)).await {
                result = Err(e);
                break;
            }
        }
        check_location(self).await;
        result
    }

    pub async fn volume_up(&self) -> Result<(), SessionError> {
        self.send_key(KEY_VOLUME_UP).await
    }

    pub async fn volume_down(&self) -> Result<(), SessionError> {
        self.send_key(KEY_VOLUME_DOWN).await
    }

    async fn send_then_recheck(&self, command: FrontendCommand) -> Result<(), SessionError> {
        let result = self.send(&command).await.map(|_| ());
        check_location(self).await;
        result
    }
}

fn check_ack(command: &str, lines: &[String]) -> Result<(), SessionError> {
    match lines.first() {
        Some(first) if first == ACK_TOKEN => {
            debug!("`{command}` acknowledged");
            Ok(())
        }
        Some(first) => {
            error!("command `{command}` returned {first}");
            Err(SessionError::UnexpectedAcknowledgement {
                command: command.to_string(),
                response: Some(first.clone()),
            })
        }
        None => {
            error!("command `{command}` returned no results");
            Err(SessionError::UnexpectedAcknowledgement {
                command: command.to_string(),
                response: None,
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
