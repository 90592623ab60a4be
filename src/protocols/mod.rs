//! Framing protocol implementations.
//!
//! Each protocol turns raw chunks received from a `Transport` into frames:
//! - `length_prefix`: `<digits><payload>` inside a single chunk
//! - `delimiter`: payload terminated by a sentinel byte, read either in
//!   chunks or one byte at a time
//!
//! Every parser implements `FrameParser`, so the session loop can drive
//! whichever one `FramingMode` selects.

pub mod delimiter;
pub mod length_prefix;

use bytes::Bytes;
use serde::Deserialize;

use delimiter::parser::{BytewiseDelimiterParser, ChunkedDelimiterParser};
use length_prefix::parser::LengthPrefixParser;

/// Default size of a single receive in the chunked framing modes.
pub const MESSAGE_SIZE: usize = 40;

/// Default frame terminator for the delimiter framing modes.
pub const DELIMITER: u8 = b'#';

/// Termination command recognized by every framing mode.
pub const QUIT_COMMAND: &[u8] = b"quit";

/// A decoded application message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Bytes to echo back to the client.
    Payload(Bytes),
    /// Client asked the server to stop.
    Quit,
}

/// Frame decoding errors.
///
/// Both are local to the session that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// No decimal digit before the first non-digit byte.
    MalformedLength,
    /// Declared payload length runs past the received bytes.
    FrameTooShort {
        /// Length declared by the prefix.
        declared: usize,
        /// Bytes actually available after the prefix.
        available: usize,
    },
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::MalformedLength => write!(f, "Malformed length prefix: no digits"),
            FrameError::FrameTooShort {
                declared,
                available,
            } => write!(
                f,
                "Frame too short: declared {} bytes, only {} available",
                declared, available
            ),
        }
    }
}

impl std::error::Error for FrameError {}

/// A framing strategy driven by the session loop.
pub trait FrameParser {
    /// Maximum number of bytes to request from the transport per receive.
    fn read_size(&self) -> usize;

    /// Upper bound on an echoed payload, if this framing has one.
    fn max_echo(&self) -> Option<usize>;

    /// Feed one received chunk.
    ///
    /// Returns `Ok(None)` when the chunk did not complete a frame.
    fn decode(&mut self, chunk: &[u8]) -> Result<Option<Frame>, FrameError>;
}

/// Framing scheme selected at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FramingMode {
    /// `<digits><payload>` within one chunk.
    LengthPrefix,
    /// Chunked reads, frame ends when a chunk ends with the delimiter.
    Delimiter,
    /// One byte per read, payload accumulated until the delimiter.
    DelimiterBytewise,
}

impl FramingMode {
    /// Build a fresh parser for one session.
    pub fn parser(self, message_size: usize, delimiter: u8) -> Box<dyn FrameParser + Send> {
        match self {
            FramingMode::LengthPrefix => Box::new(LengthPrefixParser::new(message_size)),
            FramingMode::Delimiter => {
                Box::new(ChunkedDelimiterParser::new(message_size, delimiter))
            }
            FramingMode::DelimiterBytewise => Box::new(BytewiseDelimiterParser::new(delimiter)),
        }
    }
}
