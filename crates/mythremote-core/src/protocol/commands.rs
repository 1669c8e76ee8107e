//! Typed vocabulary of frontend commands.
//!
//! The frontend understands a handful of verbs.  State-changing verbs
//! (`jump`, `key`, `play`) answer `OK` on success; `query` answers with data
//! lines; `exit` closes the connection without answering.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Key token that lowers the frontend volume.
pub const KEY_VOLUME_DOWN: &str = "[";
/// Key token that raises the frontend volume.
pub const KEY_VOLUME_UP: &str = "]";

/// Error returned when a command line cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("`{verb}` requires an argument")]
    MissingArgument { verb: String },
}

/// A single command the frontend understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendCommand {
    /// Jump straight to a named screen, e.g. `mainmenu` or `livetv`.
    Jump(String),
    /// Press a key, e.g. `enter`, `escape`, or a single character.
    Key(String),
    /// Playback control, e.g. `speed pause` or `seek forward`.
    Play(String),
    /// Read-only query, e.g. `location`.
    Query(String),
    /// Close the connection gracefully.
    Exit,
    /// Any other line, sent verbatim.
    Raw(String),
}

impl FrontendCommand {
    /// Returns the command line without its terminator.
    pub fn to_line(&self) -> String {
        match self {
            Self::Jump(arg) => format!("jump {arg}"),
            Self::Key(arg) => format!("key {arg}"),
            Self::Play(arg) => format!("play {arg}"),
            Self::Query(arg) => format!("query {arg}"),
            Self::Exit => "exit".to_string(),
            Self::Raw(line) => line.clone(),
        }
    }

    /// Whether the frontend answers this command with an `OK` acknowledgement.
    pub fn expects_ack(&self) -> bool {
        matches!(self, Self::Jump(_) | Self::Key(_) | Self::Play(_))
    }
}

impl fmt::Display for FrontendCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

impl FromStr for FrontendCommand {
    type Err = CommandParseError;

    /// Parses `<verb> <args>`.  Unknown verbs become [`FrontendCommand::Raw`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        if line.is_empty() {
            return Err(CommandParseError::Empty);
        }

        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let require = |arg: &str| {
            if arg.is_empty() {
                Err(CommandParseError::MissingArgument {
                    verb: verb.to_ascii_lowercase(),
                })
            } else {
                Ok(arg.to_string())
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "jump" => require(arg).map(Self::Jump),
            "key" => require(arg).map(Self::Key),
            "play" => require(arg).map(Self::Play),
            "query" => require(arg).map(Self::Query),
            "exit" if arg.is_empty() => Ok(Self::Exit),
            _ => Ok(Self::Raw(line.to_string())),
        }
    }
}

/// Translates free text into the key tokens that type it on the frontend.
///
/// Whitespace characters have named keys; every other character is sent as
/// itself.
pub fn key_tokens_for_text(text: &str) -> Vec<String> {
    text.chars()
        .map(|c| match c {
            '\t' => "tab".to_string(),
            ' ' => "space".to_string(),
            '\n' => "enter".to_string(),
            other => other.to_string(),
        })
        .collect()
}
