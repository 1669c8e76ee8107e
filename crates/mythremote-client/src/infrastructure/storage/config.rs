//! TOML configuration for the remote-control client.
//!
//! Read from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\MythRemote\config.toml`
//! - Linux:    `~/.config/mythremote/config.toml`
//! - macOS:    `~/Library/Application Support/MythRemote/config.toml`
//!
//! Example:
//!
//! ```toml
//! default_frontend = "Living room"
//!
//! [session]
//! poll_interval_ms = 5000
//! read_timeout_ms = 2000
//! connect_timeout_ms = 5000
//! log_level = "info"
//!
//! [[frontends]]
//! name = "Living room"
//! address = "192.168.1.20"
//! port = 6546
//! ```
//!
//! Every field has a default, so a missing file, a missing section, or a
//! missing key all behave the same as the values shown above.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mythremote_core::FrontendEndpoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::session::SessionConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `default_frontend` (or `--frontend`) names no `[[frontends]]` entry.
    #[error("no frontend named `{0}` in config")]
    UnknownFrontend(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub session: SessionSettings,
    /// Frontends the user can pick from.
    #[serde(default)]
    pub frontends: Vec<FrontendEndpoint>,
    /// Name of the entry in `frontends` used when none is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_frontend: Option<String>,
}

/// Timing and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// Location poll period; zero or negative disables polling.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: i64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_poll_interval_ms() -> i64 {
    5000
}
fn default_read_timeout_ms() -> u64 {
    2000
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            log_level: default_log_level(),
        }
    }
}

impl SessionSettings {
    /// Timeouts for the session's links.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }
}

impl ClientConfig {
    /// Picks a frontend by name, falling back to `default_frontend` and then
    /// to the first entry.  Name matching ignores ASCII case.
    ///
    /// Returns `Ok(None)` when no name was given and no frontends are listed.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownFrontend`] when a name was given (explicitly or
    /// via `default_frontend`) but matches no entry.
    pub fn select_frontend(
        &self,
        name: Option<&str>,
    ) -> Result<Option<FrontendEndpoint>, ConfigError> {
        match name.or(self.default_frontend.as_deref()) {
            Some(wanted) => self
                .frontends
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(wanted))
                .cloned()
                .map(Some)
                .ok_or_else(|| ConfigError::UnknownFrontend(wanted.to_string())),
            None => Ok(self.frontends.first().cloned()),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config from the platform location, or defaults if absent.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the config at `path`, returning `ClientConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("MythRemote"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("mythremote"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("MythRemote")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_timings() {
        // Arrange / Act
        let cfg = ClientConfig::default();

        // Assert
        assert_eq!(cfg.session.poll_interval_ms, 5000);
        assert_eq!(cfg.session.read_timeout_ms, 2000);
        assert_eq!(cfg.session.connect_timeout_ms, 5000);
        assert_eq!(cfg.session.log_level, "info");
        assert!(cfg.frontends.is_empty());
        assert_eq!(cfg.session.session_config(), SessionConfig::default());
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let cfg: ClientConfig = toml::from_str("").expect("parse");
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_partial_session_section_keeps_other_defaults() {
        let cfg: ClientConfig = toml::from_str(
            r#"
            [session]
            poll_interval_ms = 0
            log_level = "debug"
            "#,
        )
        .expect("parse");

        assert_eq!(cfg.session.poll_interval_ms, 0);
        assert_eq!(cfg.session.log_level, "debug");
        assert_eq!(cfg.session.read_timeout_ms, 2000);
    }

    #[test]
    fn test_frontends_parse_with_default_port() {
        let cfg: ClientConfig = toml::from_str(
            r#"
            default_frontend = "bedroom"

            [[frontends]]
            name = "Living room"
            address = "192.168.1.20"

            [[frontends]]
            name = "Bedroom"
            address = "bedroom.local"
            port = 7000
            "#,
        )
        .expect("parse");

        assert_eq!(cfg.frontends.len(), 2);
        assert_eq!(cfg.frontends[0].port, 6546);
        let selected = cfg.select_frontend(None).unwrap().unwrap();
        assert_eq!(selected.address, "bedroom.local");
        assert_eq!(selected.port, 7000);
    }

    #[test]
    fn test_select_frontend_explicit_name_wins() {
        let cfg = ClientConfig {
            frontends: vec![
                FrontendEndpoint::new("Den", "10.0.0.5"),
                FrontendEndpoint::new("Attic", "10.0.0.6"),
            ],
            default_frontend: Some("Den".into()),
            ..ClientConfig::default()
        };

        let selected = cfg.select_frontend(Some("attic")).unwrap().unwrap();

        assert_eq!(selected.name, "Attic");
    }

    #[test]
    fn test_select_frontend_unknown_name_is_an_error() {
        let cfg = ClientConfig {
            frontends: vec![FrontendEndpoint::new("Den", "10.0.0.5")],
            ..ClientConfig::default()
        };

        let result = cfg.select_frontend(Some("Garage"));

        assert!(matches!(result, Err(ConfigError::UnknownFrontend(name)) if name == "Garage"));
    }

    #[test]
    fn test_select_frontend_falls_back_to_first_entry() {
        let cfg = ClientConfig {
            frontends: vec![FrontendEndpoint::new("Den", "10.0.0.5")],
            ..ClientConfig::default()
        };
        assert_eq!(cfg.select_frontend(None).unwrap().unwrap().name, "Den");
        assert_eq!(ClientConfig::default().select_frontend(None).unwrap(), None);
    }

    #[test]
    fn test_load_config_from_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("mythremote-test-missing-config.toml");
        let _ = std::fs::remove_file(&path);

        let cfg = load_config_from(&path).expect("defaults");

        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_load_config_from_malformed_file_is_parse_error() {
        let path = std::env::temp_dir().join(format!(
            "mythremote-test-bad-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[session\npoll_interval_ms = ").expect("write");

        let result = load_config_from(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
