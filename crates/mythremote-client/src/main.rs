//! MythRemote command-line remote control.
//!
//! Connects to one frontend, keeps the location poller running, and turns
//! lines typed on stdin into frontend commands.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()             -- TOML file, or defaults
//!  └─ RemoteControl::new()      -- session + dispatcher + poller
//!  └─ remote.connect(endpoint)  -- Connecting → Connected | Error
//!  └─ select! loop
//!       ├─ stdin line      -> ReplCommand -> RemoteControl
//!       ├─ SessionEvent    -> printed
//!       └─ Ctrl+C          -> disconnect and exit
//! ```
//!
//! Example session:
//!
//! ```text
//! $ mythremote --host 192.168.1.20 --name "Living room"
//! [Connecting] Connecting
//! [Connected] Living room - Connected
//! jump livetv
//! OK
//! [location] Playback LiveTV 0:00:12 of 1:00:00 1x 1031 ...
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use mythremote_core::{
    CommandParseError, FrontendCommand, FrontendEndpoint, DEFAULT_FRONTEND_PORT,
};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mythremote_client::application::poll_location::interval_from_ms;
use mythremote_client::application::session::SessionError;
use mythremote_client::infrastructure::network::TcpConnector;
use mythremote_client::infrastructure::ui_bridge::StatusDto;
use mythremote_client::infrastructure::storage::config::{
    load_config, load_config_from, ClientConfig, ConfigError,
};
use mythremote_client::{ChannelListener, RemoteControl, SessionEvent};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote control for a MythTV frontend.
///
/// Reads commands from stdin, one per line: `jump <screen>`, `key <key>`,
/// `play <command>`, `query <name>`, `text <words>`, `raw <line>`,
/// `volume up|down`, `status [json]`, `quit`.
#[derive(Debug, Parser)]
#[command(name = "mythremote", about = "Remote control for a MythTV frontend", version)]
struct Cli {
    /// Config file to read instead of the platform default.
    #[arg(long, env = "MYTHREMOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Name of a `[[frontends]]` entry in the config file.
    #[arg(long, env = "MYTHREMOTE_FRONTEND")]
    frontend: Option<String>,

    /// Frontend host name or IP address.  Overrides `--frontend`.
    #[arg(long, env = "MYTHREMOTE_HOST")]
    host: Option<String>,

    /// Frontend control port, used with `--host`.
    #[arg(long, default_value_t = DEFAULT_FRONTEND_PORT, env = "MYTHREMOTE_PORT")]
    port: u16,

    /// Display name for `--host`, shown in status messages.
    #[arg(long, default_value = "MythTV", env = "MYTHREMOTE_NAME")]
    name: String,

    /// Location poll period in milliseconds; zero or negative disables
    /// polling.  Defaults to the config file value.
    #[arg(long, env = "MYTHREMOTE_POLL_INTERVAL_MS", allow_negative_numbers = true)]
    poll_interval_ms: Option<i64>,
}

impl Cli {
    /// Picks the endpoint: `--host` wins, then `--frontend`, then the
    /// config file's default.
    ///
    /// # Errors
    ///
    /// Returns an error if the named frontend does not exist, or if no
    /// frontend is given at all.
    fn resolve_endpoint(&self, config: &ClientConfig) -> anyhow::Result<FrontendEndpoint> {
        if let Some(host) = &self.host {
            return Ok(FrontendEndpoint::new(self.name.clone(), host.clone()).with_port(self.port));
        }
        match config.select_frontend(self.frontend.as_deref())? {
            Some(endpoint) => Ok(endpoint),
            None => bail!("no frontend configured: pass --host or add a [[frontends]] entry"),
        }
    }

    fn load_config(&self) -> anyhow::Result<ClientConfig> {
        match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => match load_config() {
                Err(ConfigError::NoPlatformConfigDir) => Ok(ClientConfig::default()),
                other => other.context("failed to load config"),
            },
        }
    }
}

// ── Stdin commands ────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
enum ReplError {
    #[error(transparent)]
    Command(#[from] CommandParseError),
    #[error("usage: volume up|down")]
    Volume,
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Frontend(FrontendCommand),
    Text(String),
    VolumeUp,
    VolumeDown,
    Status,
    StatusJson,
    Quit,
}

impl FromStr for ReplCommand {
    type Err = ReplError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "quit" | "exit" if rest.is_empty() => Ok(Self::Quit),
            "status" if rest.is_empty() => Ok(Self::Status),
            "status" if rest.eq_ignore_ascii_case("json") => Ok(Self::StatusJson),
            "text" if rest.is_empty() => Err(ReplError::Usage("text <words>")),
            "text" => Ok(Self::Text(rest.to_string())),
            "raw" if rest.is_empty() => Err(ReplError::Usage("raw <line>")),
            "raw" => Ok(Self::Frontend(FrontendCommand::Raw(rest.to_string()))),
            "volume" => match rest.to_ascii_lowercase().as_str() {
                "up" | "+" => Ok(Self::VolumeUp),
                "down" | "-" => Ok(Self::VolumeDown),
                _ => Err(ReplError::Volume),
            },
            _ => Ok(Self::Frontend(line.parse()?)),
        }
    }
}

/// Runs one command.  Returns `false` when the user asked to quit.
async fn run_command(remote: &RemoteControl, command: ReplCommand) -> Result<bool, SessionError> {
    match command {
        ReplCommand::Frontend(FrontendCommand::Jump(screen)) => remote.send_jump(&screen).await?,
        ReplCommand::Frontend(FrontendCommand::Key(key)) => remote.send_key(&key).await?,
        ReplCommand::Frontend(FrontendCommand::Play(cmd)) => remote.send_play(&cmd).await?,
        ReplCommand::Frontend(FrontendCommand::Query(name)) => {
            for line in remote.query(&name).await? {
                println!("{line}");
            }
            return Ok(true);
        }
        ReplCommand::Frontend(FrontendCommand::Raw(line)) => {
            for reply in remote.execute(&line, false).await? {
                println!("{reply}");
            }
            return Ok(true);
        }
        ReplCommand::Frontend(FrontendCommand::Exit) | ReplCommand::Quit => return Ok(false),
        ReplCommand::Text(text) => remote.send_text(&text).await?,
        ReplCommand::VolumeUp => remote.volume_up().await?,
        ReplCommand::VolumeDown => remote.volume_down().await?,
        ReplCommand::Status => {
            let status = remote.status();
            println!("{} ({}): {}", status.state, status.state.code(), status.message);
            return Ok(true);
        }
        ReplCommand::StatusJson => {
            let dto = StatusDto::new(&remote.status(), &remote.session().location());
            match dto.to_json() {
                Ok(json) => println!("{json}"),
                Err(e) => warn!("could not encode status: {e}"),
            }
            return Ok(true);
        }
    }
    println!("OK");
    Ok(true)
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::StatusChanged { message, state } => println!("[{state}] {message}"),
        SessionEvent::LocationChanged { location } => println!("[location] {location}"),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.session.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let endpoint = cli.resolve_endpoint(&config)?;
    let poll_interval =
        interval_from_ms(cli.poll_interval_ms.unwrap_or(config.session.poll_interval_ms));

    info!("MythRemote starting; frontend {endpoint}");

    let connector = Arc::new(TcpConnector::new(config.session.session_config()));
    let remote = RemoteControl::new(connector, poll_interval);
    let (listener, mut events) = ChannelListener::new();
    remote.set_listener(listener);

    let attempt = remote.connect(endpoint);
    tokio::spawn(async move {
        match attempt.await {
            Ok(Err(SessionError::Superseded)) | Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("connect failed: {e}"),
            Err(e) => error!("connect task failed: {e}"),
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<ReplCommand>() {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                match run_command(&remote, command).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("error: {e}"),
                }
            }
            Some(event) = events.recv() => print_event(&event),
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("failed to listen for Ctrl+C signal: {e}");
                }
                info!("received Ctrl+C; disconnecting");
                break;
            }
        }
    }

    remote.disconnect().await;
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }
    info!("MythRemote stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["mythremote"]);
        assert_eq!(cli.port, 6546);
        assert_eq!(cli.name, "MythTV");
        assert!(cli.host.is_none());
        assert!(cli.poll_interval_ms.is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "mythremote",
            "--host",
            "10.0.0.5",
            "--port",
            "7000",
            "--name",
            "Den",
            "--poll-interval-ms",
            "-1",
        ]);
        assert_eq!(cli.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(cli.port, 7000);
        assert_eq!(cli.name, "Den");
        assert_eq!(cli.poll_interval_ms, Some(-1));
    }

    #[test]
    fn test_host_overrides_config_frontend() {
        let cli = Cli::parse_from(["mythremote", "--host", "10.0.0.9", "--name", "Den"]);
        let config = ClientConfig {
            frontends: vec![FrontendEndpoint::new("Attic", "10.0.0.6")],
            ..ClientConfig::default()
        };

        let endpoint = cli.resolve_endpoint(&config).unwrap();

        assert_eq!(endpoint, FrontendEndpoint::new("Den", "10.0.0.9"));
    }

    #[test]
    fn test_frontend_name_selects_config_entry() {
        let cli = Cli::parse_from(["mythremote", "--frontend", "attic"]);
        let config = ClientConfig {
            frontends: vec![
                FrontendEndpoint::new("Den", "10.0.0.5"),
                FrontendEndpoint::new("Attic", "10.0.0.6").with_port(7000),
            ],
            ..ClientConfig::default()
        };

        let endpoint = cli.resolve_endpoint(&config).unwrap();

        assert_eq!(endpoint.address, "10.0.0.6");
        assert_eq!(endpoint.port, 7000);
    }

    #[test]
    fn test_no_frontend_is_an_error() {
        let cli = Cli::parse_from(["mythremote"]);
        assert!(cli.resolve_endpoint(&ClientConfig::default()).is_err());
    }

    #[test]
    fn test_repl_parses_frontend_verbs() {
        assert_eq!(
            "jump livetv".parse::<ReplCommand>(),
            Ok(ReplCommand::Frontend(FrontendCommand::Jump("livetv".into())))
        );
        assert_eq!(
            "PLAY speed pause".parse::<ReplCommand>(),
            Ok(ReplCommand::Frontend(FrontendCommand::Play("speed pause".into())))
        );
        assert_eq!(
            "raw help".parse::<ReplCommand>(),
            Ok(ReplCommand::Frontend(FrontendCommand::Raw("help".into())))
        );
    }

    #[test]
    fn test_repl_parses_local_commands() {
        assert_eq!("quit".parse::<ReplCommand>(), Ok(ReplCommand::Quit));
        assert_eq!("status".parse::<ReplCommand>(), Ok(ReplCommand::Status));
        assert_eq!("status JSON".parse::<ReplCommand>(), Ok(ReplCommand::StatusJson));
        assert_eq!("volume up".parse::<ReplCommand>(), Ok(ReplCommand::VolumeUp));
        assert_eq!("volume -".parse::<ReplCommand>(), Ok(ReplCommand::VolumeDown));
        assert_eq!(
            "text hello world".parse::<ReplCommand>(),
            Ok(ReplCommand::Text("hello world".into()))
        );
    }

    #[test]
    fn test_repl_rejects_incomplete_commands() {
        assert_eq!("volume".parse::<ReplCommand>(), Err(ReplError::Volume));
        assert_eq!(
            "text".parse::<ReplCommand>(),
            Err(ReplError::Usage("text <words>"))
        );
        assert!(matches!(
            "key".parse::<ReplCommand>(),
            Err(ReplError::Command(CommandParseError::MissingArgument { .. }))
        ));
    }
}
