//! Protocol module containing the line codec and the command vocabulary.

pub mod codec;
pub mod commands;

pub use codec::{
    decode_frame, decode_response, encode_command, Frame, ProtocolError, ACK_TOKEN, MAX_LINE_LEN,
    PROMPT,
};
pub use commands::{
    key_tokens_for_text, CommandParseError, FrontendCommand, KEY_VOLUME_DOWN, KEY_VOLUME_UP,
};
