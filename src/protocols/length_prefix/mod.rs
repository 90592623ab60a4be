//! Length-prefixed framing.
//!
//! A frame is a run of ASCII decimal digits immediately followed by exactly
//! that many payload bytes, all inside one receive of at most
//! `MESSAGE_SIZE` bytes:
//!
//! ```text
//! Request:  5hello
//! Response: hello
//!
//! Request:  007abc1234
//! Response: abc1234
//! ```
//!
//! Leading zeros in the prefix are insignificant; the count is always read
//! in base 10. A payload starting with `quit` stops the server and is not
//! echoed.

pub mod parser;
