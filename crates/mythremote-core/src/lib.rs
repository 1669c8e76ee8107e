//! # mythremote-core
//!
//! Shared library for MythRemote containing the line protocol codec, the
//! frontend command vocabulary, and the session domain types.
//!
//! It has no dependencies on sockets, async runtimes, or UI frameworks, so
//! every piece of it can be exercised with plain byte slices in unit tests.
//!
//! # How the frontend protocol works (for beginners)
//!
//! A MythTV frontend exposes a "network control" port (6546 by default) that
//! speaks plain text, much like a telnet session:
//!
//! ```text
//! client → frontend   jump mainmenu\n
//! frontend → client   OK\r\n
//! frontend → client   #
//! ```
//!
//! Every response ends with a two-character *prompt*, `#` followed by a
//! space.  The prompt is never part of the data; it only tells the client
//! that the frontend is ready for the next command.
//!
//! - **`protocol`** – encoding commands and decoding responses
//!   (`protocol::codec`), plus the typed command vocabulary
//!   (`protocol::commands`).
//!
//! - **`domain`** – value types shared by every layer: the frontend endpoint,
//!   session state and status codes, and the location snapshot used to
//!   de-duplicate location-change notifications.

pub mod domain;
pub mod protocol;

pub use domain::endpoint::{FrontendEndpoint, DEFAULT_FRONTEND_PORT};
pub use domain::location::{FrontendLocation, LocationSnapshot};
pub use domain::status::{SessionState, SessionStatus};
pub use protocol::codec::{
    decode_frame, decode_response, encode_command, Frame, ProtocolError, ACK_TOKEN,
};
pub use protocol::commands::{
    key_tokens_for_text, CommandParseError, FrontendCommand, KEY_VOLUME_DOWN, KEY_VOLUME_UP,
};
