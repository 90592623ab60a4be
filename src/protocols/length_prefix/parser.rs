//! Length-prefix parser.

use bytes::Bytes;

use crate::protocols::{Frame, FrameError, FrameParser, QUIT_COMMAND};

/// Parser for `<digits><payload>` chunks.
#[derive(Debug, Clone)]
pub struct LengthPrefixParser {
    message_size: usize,
}

impl LengthPrefixParser {
    pub fn new(message_size: usize) -> Self {
        Self { message_size }
    }
}

impl FrameParser for LengthPrefixParser {
    fn read_size(&self) -> usize {
        self.message_size
    }

    fn max_echo(&self) -> Option<usize> {
        Some(self.message_size)
    }

    fn decode(&mut self, chunk: &[u8]) -> Result<Option<Frame>, FrameError> {
        parse(chunk).map(Some)
    }
}

/// Parse one length-prefixed frame from a received chunk.
///
/// The payload is bounds-checked against `input`; a declared length that
/// runs past the chunk is `FrameError::FrameTooShort`.
pub fn parse(input: &[u8]) -> Result<Frame, FrameError> {
    let (declared, payload_start) = parse_length(input)?;

    let payload = input
        .get(payload_start..payload_start.saturating_add(declared))
        .ok_or(FrameError::FrameTooShort {
            declared,
            available: input.len() - payload_start,
        })?;

    if payload.starts_with(QUIT_COMMAND) {
        return Ok(Frame::Quit);
    }

    Ok(Frame::Payload(Bytes::copy_from_slice(payload)))
}

/// Read the decimal prefix.
///
/// Returns the declared length and the index of the first non-digit byte
/// (or `input.len()` when every byte is a digit).
fn parse_length(input: &[u8]) -> Result<(usize, usize), FrameError> {
    let digits = input.iter().take_while(|b| b.is_ascii_digit()).count();

    // Leading zeros are dropped entirely; a prefix of only zeros has no
    // digits left to count.
    let significant = &input[..digits];
    let zeros = significant.iter().take_while(|&&b| b == b'0').count();
    let significant = &significant[zeros..];
    if significant.is_empty() {
        return Err(FrameError::MalformedLength);
    }

    // Oversized prefixes saturate and fail the bounds check.
    let declared = significant.iter().fold(0usize, |acc, b| {
        acc.saturating_mul(10).saturating_add(usize::from(b - b'0'))
    });

    Ok((declared, digits))
}
