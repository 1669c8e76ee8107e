//! Line codec for the frontend network control protocol.
//!
//! Wire format:
//! ```text
//! client → frontend   <verb> <args>\n
//! frontend → client   <line>\r\n ... <line>\r\n#
//! ```
//! A response is zero or more lines followed by the two-character prompt
//! `"# "`.  The prompt carries no line terminator.
//!
//! # Why a sans-I/O codec? (for beginners)
//!
//! The decoder works on byte slices and reports how many bytes it consumed,
//! exactly like a length-prefixed binary codec would.  The network layer owns
//! the socket and the receive buffer; it appends whatever `read()` returned
//! and calls [`decode_frame`] in a loop until it sees
//! [`ProtocolError::InsufficientData`].  Keeping I/O out of this module means
//! every edge case (split prompts, CRLF endings, over-long lines) can be
//! tested without a socket.

use thiserror::Error;

/// The prompt the frontend prints when it is ready for the next command.
pub const PROMPT: &[u8; 2] = b"# ";

/// First response line of a state-changing command that succeeded.
pub const ACK_TOKEN: &str = "OK";

/// Longest line the decoder will buffer before giving up on the stream.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Errors that can occur while decoding frontend output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// More bytes are required before the next frame can be decoded.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// A line grew past [`MAX_LINE_LEN`] without a terminator.
    #[error("response line exceeds {limit} bytes without a newline")]
    LineTooLong { limit: usize },
}

/// One unit of frontend output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A data line with its terminator (and any trailing `\r`) removed.
    Line(String),
    /// The `"# "` prompt that ends a response.
    Prompt,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a command for transmission.
///
/// Exactly one `\n` is appended when `command` does not already end with one.
///
/// # Examples
///
/// ```rust
/// use mythremote_core::encode_command;
///
/// assert_eq!(encode_command("jump mainmenu"), b"jump mainmenu\n".to_vec());
/// assert_eq!(encode_command("key enter\n"), b"key enter\n".to_vec());
/// ```
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(command.len() + 1);
    buf.extend_from_slice(command.as_bytes());
    if !command.ends_with('\n') {
        buf.push(b'\n');
    }
    buf
}

/// Decodes one [`Frame`] from the beginning of `bytes`.
///
/// The first two bytes decide the frame kind: if they are the prompt the
/// frame is [`Frame::Prompt`]; otherwise they are the start of a data line
/// that runs up to the next `\n`.
///
/// Returns the frame and the number of bytes consumed, so the caller can
/// advance its receive buffer.
///
/// # Errors
///
/// - [`ProtocolError::InsufficientData`] when the buffer ends mid-frame.
/// - [`ProtocolError::LineTooLong`] when no newline appears within
///   [`MAX_LINE_LEN`] bytes.
///
/// # Examples
///
/// ```rust
/// use mythremote_core::{decode_frame, Frame};
///
/// let (frame, used) = decode_frame(b"OK\r\n# ").unwrap();
/// assert_eq!(frame, Frame::Line("OK".to_string()));
/// assert_eq!(used, 4);
///
/// let (frame, used) = decode_frame(b"# ").unwrap();
/// assert_eq!(frame, Frame::Prompt);
/// assert_eq!(used, 2);
/// ```
pub fn decode_frame(bytes: &[u8]) -> Result<(Frame, usize), ProtocolError> {
    if bytes.starts_with(PROMPT) {
        return Ok((Frame::Prompt, PROMPT.len()));
    }

    // A lone '#' may be the first half of a prompt split across two reads.
    if bytes.is_empty() || bytes == b"#" {
        return Err(ProtocolError::InsufficientData {
            needed: PROMPT.len(),
            available: bytes.len(),
        });
    }

    match bytes.iter().position(|&b| b == b'\n') {
        Some(end) => {
            let mut line = &bytes[..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            Ok((
                Frame::Line(String::from_utf8_lossy(line).into_owned()),
                end + 1,
            ))
        }
        None if bytes.len() > MAX_LINE_LEN => Err(ProtocolError::LineTooLong {
            limit: MAX_LINE_LEN,
        }),
        None => Err(ProtocolError::InsufficientData {
            needed: bytes.len() + 1,
            available: bytes.len(),
        }),
    }
}

/// Decodes a complete response: every line up to and including the prompt.
///
/// Returns the lines (prompt excluded) and the total number of bytes
/// consumed.
///
/// # Errors
///
/// Propagates [`decode_frame`] errors; `InsufficientData` means the prompt
/// has not arrived yet.
///
/// # Examples
///
/// ```rust
/// use mythremote_core::decode_response;
///
/// let (lines, used) = decode_response(b"line1\nline2\n# ").unwrap();
/// assert_eq!(lines, vec!["line1", "line2"]);
/// assert_eq!(used, 14);
/// ```
pub fn decode_response(bytes: &[u8]) -> Result<(Vec<String>, usize), ProtocolError> {
    let mut lines = Vec::new();
    let mut offset = 0;

    loop {
        match decode_frame(&bytes[offset..])? {
            (Frame::Prompt, used) => return Ok((lines, offset + used)),
            (Frame::Line(line), used) => {
                lines.push(line);
                offset += used;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
