//! Storage infrastructure: the read-only configuration file.
//!
//! The `config` sub-module locates the platform config directory, reads the
//! TOML file if there is one, and falls back to defaults on first run.  The
//! client never writes the file; users edit it by hand.

pub mod config;
