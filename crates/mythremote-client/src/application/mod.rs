//! Application layer for the client.
//!
//! # What lives here?
//!
//! - **`session`** – The single `Session` object that owns every piece of
//!   mutable connection state: the link to the frontend, the status, the
//!   endpoint, and the location snapshot.  It defines the `FrontendLink` and
//!   `LinkConnector` traits the infrastructure layer implements.
//!
//! - **`dispatch_command`** – Executes one command at a time against the
//!   session and validates the `OK` acknowledgement.
//!
//! - **`poll_location`** – The recurring `query location` task and the
//!   location re-check that follows jump/key/play commands.
//!
//! - **`notify`** – Ordered delivery of status and location events to the
//!   registered `SessionListener`.
//!
//! - **`remote_control`** – The facade a UI layer talks to.

pub mod dispatch_command;
pub mod notify;
pub mod poll_location;
pub mod remote_control;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;
