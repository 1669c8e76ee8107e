//! Infrastructure layer for the client.
//!
//! Contains the OS-facing adapters: TCP I/O, the config file, and the UI
//! event bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `mythremote_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – `TcpConnector` and `TcpFrontendLink`, the production
//!   implementations of the session's `LinkConnector` and `FrontendLink`
//!   traits.  Handles DNS resolution, connect/read timeouts, and framing
//!   responses with the core line codec.
//!
//! - **`storage`** – Read-only TOML configuration: known frontends, poll
//!   interval, timeouts, and log level.
//!
//! - **`ui_bridge`** – `ChannelListener`, which turns session callbacks into
//!   a Tokio channel, plus serializable status DTOs.

pub mod network;
pub mod storage;
pub mod ui_bridge;
