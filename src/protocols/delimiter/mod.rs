//! Delimiter-terminated framing.
//!
//! A frame is arbitrary bytes followed by a single delimiter byte (`#` by
//! default). Two read granularities are supported:
//!
//! - **Chunked**: each receive takes up to `MESSAGE_SIZE` bytes. A chunk
//!   completes a frame only when its *last* byte is the delimiter; a
//!   delimiter anywhere else in the chunk is ignored. The whole chunk,
//!   delimiter included, is echoed. A chunk starting with `quit` stops the
//!   server.
//!
//! - **Bytewise**: each receive takes one byte. Bytes accumulate until the
//!   delimiter arrives, then the accumulated payload (delimiter excluded) is
//!   echoed and the buffer is cleared. A payload of exactly `quit` stops the
//!   server.
//!
//! ```text
//! Chunked request:   hello#
//! Chunked response:  hello#
//!
//! Bytewise request:  h i #
//! Bytewise response: hi
//! ```

pub mod parser;
