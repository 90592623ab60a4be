//! Delimiter parsers.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::protocols::{Frame, FrameError, FrameParser, QUIT_COMMAND};

/// Chunked delimiter parser.
///
/// Keeps no state between chunks: a chunk that does not end with the
/// delimiter is dropped.
#[derive(Debug, Clone)]
pub struct ChunkedDelimiterParser {
    message_size: usize,
    delimiter: u8,
}

impl ChunkedDelimiterParser {
    pub fn new(message_size: usize, delimiter: u8) -> Self {
        Self {
            message_size,
            delimiter,
        }
    }
}

impl FrameParser for ChunkedDelimiterParser {
    fn read_size(&self) -> usize {
        self.message_size
    }

    fn max_echo(&self) -> Option<usize> {
        Some(self.message_size)
    }

    fn decode(&mut self, chunk: &[u8]) -> Result<Option<Frame>, FrameError> {
        Ok(parse_chunk(chunk, self.delimiter))
    }
}

/// Parse one received chunk.
///
/// Only a delimiter in the final position ends a frame. The quit check looks
/// at the start of the whole chunk, and the echoed payload is the whole
/// chunk including its delimiter.
pub fn parse_chunk(chunk: &[u8], delimiter: u8) -> Option<Frame> {
    if chunk.last() != Some(&delimiter) {
        return None;
    }

    debug!("Hit the delimiter");

    if chunk.starts_with(QUIT_COMMAND) {
        return Some(Frame::Quit);
    }

    Some(Frame::Payload(Bytes::copy_from_slice(chunk)))
}

/// Bytewise delimiter parser.
///
/// Accumulates payload bytes across receives until the delimiter arrives.
#[derive(Debug)]
pub struct BytewiseDelimiterParser {
    delimiter: u8,
    buffer: BytesMut,
}

impl BytewiseDelimiterParser {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            buffer: BytesMut::new(),
        }
    }

    /// Feed a single byte.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        if byte != self.delimiter {
            self.buffer.put_u8(byte);
            return None;
        }

        debug!("Hit the delimiter");

        // split() leaves the buffer empty for the next message
        let payload = self.buffer.split().freeze();
        if payload == QUIT_COMMAND {
            return Some(Frame::Quit);
        }

        Some(Frame::Payload(payload))
    }
}

impl FrameParser for BytewiseDelimiterParser {
    fn read_size(&self) -> usize {
        1
    }

    fn max_echo(&self) -> Option<usize> {
        None
    }

    /// Chunks are at most `read_size()` bytes, so at most one delimiter is
    /// seen per call.
    fn decode(&mut self, chunk: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in chunk {
            if let Some(frame) = self.push(byte) {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_ending_with_delimiter() {
        match parse_chunk(b"hello#", b'#') {
            Some(Frame::Payload(data)) => assert_eq!(&data[..], b"hello#"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_chunk_inner_delimiter_ignored() {
        assert_eq!(parse_chunk(b"ab#cd", b'#'), None);
        assert_eq!(parse_chunk(b"#abc", b'#'), None);
    }

    #[test]
    fn test_chunk_inner_and_trailing_delimiter() {
        match parse_chunk(b"ab#cd#", b'#') {
            Some(Frame::Payload(data)) => assert_eq!(&data[..], b"ab#cd#"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_chunk_without_delimiter() {
        assert_eq!(parse_chunk(b"hello", b'#'), None);
        assert_eq!(parse_chunk(b"", b'#'), None);
    }

    #[test]
    fn test_chunk_quit() {
        assert_eq!(parse_chunk(b"quit#", b'#'), Some(Frame::Quit));
    }

    #[test]
    fn test_chunk_quit_matches_chunk_prefix() {
        // Compared against the start of the chunk, not the text before '#'
        assert_eq!(parse_chunk(b"quitting#", b'#'), Some(Frame::Quit));
        assert!(matches!(
            parse_chunk(b"qui#", b'#'),
            Some(Frame::Payload(_))
        ));
    }

    #[test]
    fn test_chunk_custom_delimiter() {
        assert!(matches!(
            parse_chunk(b"hello\n", b'\n'),
            Some(Frame::Payload(_))
        ));
        assert_eq!(parse_chunk(b"hello#", b'\n'), None);
    }

    #[test]
    fn test_bytewise_accumulates() {
        let mut parser = BytewiseDelimiterParser::new(b'#');
        assert_eq!(parser.push(b'h'), None);
        assert_eq!(parser.push(b'i'), None);
        assert_eq!(
            parser.push(b'#'),
            Some(Frame::Payload(Bytes::from_static(b"hi")))
        );

        // Buffer is cleared after each frame
        assert_eq!(parser.push(b'#'), Some(Frame::Payload(Bytes::new())));
    }

    #[test]
    fn test_bytewise_quit() {
        let mut parser = BytewiseDelimiterParser::new(b'#');
        for &b in b"quit" {
            assert_eq!(parser.push(b), None);
        }
        assert_eq!(parser.push(b'#'), Some(Frame::Quit));
    }

    #[test]
    fn test_bytewise_quit_requires_exact_match() {
        let mut parser = BytewiseDelimiterParser::new(b'#');
        let mut last = None;
        for &b in b"quits#" {
            last = parser.push(b);
        }
        assert_eq!(last, Some(Frame::Payload(Bytes::from_static(b"quits"))));
    }

    #[test]
    fn test_bytewise_empty_frame() {
        let mut parser = BytewiseDelimiterParser::new(b'#');
        assert_eq!(parser.push(b'#'), Some(Frame::Payload(Bytes::new())));
    }

    #[test]
    fn test_bytewise_successive_frames() {
        let mut parser = BytewiseDelimiterParser::new(b'#');
        let mut frames = Vec::new();
        for &b in b"ab#cd#" {
            if let Ok(Some(frame)) = parser.decode(&[b]) {
                frames.push(frame);
            }
        }
        assert_eq!(
            frames,
            vec![
                Frame::Payload(Bytes::from_static(b"ab")),
                Frame::Payload(Bytes::from_static(b"cd")),
            ]
        );
    }

    #[test]
    fn test_bytewise_unbounded() {
        let mut parser = BytewiseDelimiterParser::new(b'#');
        for _ in 0..1000 {
            parser.push(b'x');
        }
        match parser.push(b'#') {
            Some(Frame::Payload(data)) => assert_eq!(data.len(), 1000),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
