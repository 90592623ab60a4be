//! Per-connection session loop.
//!
//! A `SessionLoop` owns one transport and one frame parser for the lifetime
//! of a single client connection. It pulls chunks, decodes frames, echoes
//! payloads, and reports back to the accept loop whether the server should
//! keep listening.

use tracing::{debug, info, trace, warn};

use crate::protocols::{Frame, FrameError, FrameParser};
use crate::transport::Transport;

/// Signal returned to the accept loop when a session ends normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Connection finished; accept the next client.
    Continue,
    /// Client sent the quit command; stop the listening loop.
    StopServer,
}

/// Errors that end a session.
#[derive(Debug)]
pub enum SessionError {
    /// Frame could not be decoded.
    Frame(FrameError),
    /// Payload is larger than the framing allows to send.
    SendFailed { len: usize, limit: usize },
    /// The transport accepted fewer bytes than requested.
    SendTruncated { expected: usize, sent: usize },
    /// Socket-level failure.
    Transport(std::io::Error),
}

impl SessionError {
    /// Whether this error should take the whole process down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Transport(_))
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Frame(e) => write!(f, "{}", e),
            SessionError::SendFailed { len, limit } => {
                write!(f, "Send failed: {} bytes exceeds limit of {}", len, limit)
            }
            SessionError::SendTruncated { expected, sent } => {
                write!(f, "Send truncated: sent {} of {} bytes", sent, expected)
            }
            SessionError::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Frame(e) => Some(e),
            SessionError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FrameError> for SessionError {
    fn from(e: FrameError) -> Self {
        SessionError::Frame(e)
    }
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Transport(e)
    }
}

/// Drives one frame parser over one transport.
pub struct SessionLoop<T> {
    transport: T,
    parser: Box<dyn FrameParser + Send>,
}

impl<T: Transport> SessionLoop<T> {
    pub fn new(transport: T, parser: Box<dyn FrameParser + Send>) -> Self {
        Self { transport, parser }
    }

    /// Serve the connection until it closes, quits, or fails.
    ///
    /// The transport is closed before returning in every case.
    pub async fn run(mut self) -> Result<SessionOutcome, SessionError> {
        let result = self.serve().await;

        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "Failed to shut down connection");
        }

        result
    }

    async fn serve(&mut self) -> Result<SessionOutcome, SessionError> {
        loop {
            let read_size = self.parser.read_size();
            let chunk = self.transport.receive(read_size).await?;

            if chunk.is_empty() {
                info!("Client closed connection");
                return Ok(SessionOutcome::Continue);
            }

            if chunk.len() > read_size {
                warn!(
                    received = chunk.len(),
                    expected = read_size,
                    "Unexpected read size, closing connection"
                );
                return Ok(SessionOutcome::Continue);
            }

            debug!(
                bytes = chunk.len(),
                data = %String::from_utf8_lossy(&chunk),
                "Received from client"
            );

            match self.parser.decode(&chunk)? {
                None => {}
                Some(Frame::Quit) => {
                    info!("Client asked to quit");
                    return Ok(SessionOutcome::StopServer);
                }
                Some(Frame::Payload(payload)) => self.echo(&payload).await?,
            }
        }
    }

    async fn echo(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        if let Some(limit) = self.parser.max_echo() {
            if payload.len() > limit {
                return Err(SessionError::SendFailed {
                    len: payload.len(),
                    limit,
                });
            }
        }

        if payload.is_empty() {
            trace!("Empty payload, nothing to echo");
            return Ok(());
        }

        let sent = self.transport.send(payload).await?;
        if sent != payload.len() {
            return Err(SessionError::SendTruncated {
                expected: payload.len(),
                sent,
            });
        }

        trace!(bytes = sent, "Echoed payload");
        Ok(())
    }
}
