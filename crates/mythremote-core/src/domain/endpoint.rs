//! The remote frontend a session connects to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// TCP port of the frontend network control interface.
pub const DEFAULT_FRONTEND_PORT: u16 = 6546;

fn default_port() -> u16 {
    DEFAULT_FRONTEND_PORT
}

/// Identifies one frontend: a display name plus a host and port.
///
/// Immutable once a session has been started with it.  `address` may be an
/// IP literal or a host name; resolution happens when connecting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrontendEndpoint {
    /// Human-readable name used in status messages, e.g. `"Living room"`.
    pub name: String,
    /// Host name or IP address.
    pub address: String,
    /// TCP port, [`DEFAULT_FRONTEND_PORT`] when omitted.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl FrontendEndpoint {
    /// Creates an endpoint on the default port.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port: DEFAULT_FRONTEND_PORT,
        }
    }

    /// Returns a copy of this endpoint on a different port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Status message shown while a session to this endpoint is up.
    pub fn connected_message(&self) -> String {
        format!("{} - Connected", self.name)
    }
}

impl fmt::Display for FrontendEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.address, self.port)
    }
}
