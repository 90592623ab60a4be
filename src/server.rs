//! TCP server for framed echo connections.
//!
//! Accepts one client at a time and runs its session to completion before
//! accepting the next. A client that sends the quit command stops the
//! listening loop.

use crate::config::Config;
use crate::protocols::FramingMode;
use crate::session::{SessionError, SessionLoop, SessionOutcome};
use crate::transport::StreamTransport;
use std::io;
use std::net::SocketAddr;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Server instance
pub struct Server {
    listener: TcpListener,
    framing: FramingMode,
    message_size: usize,
    delimiter: u8,
}

impl Server {
    /// Bind the listening socket described by `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(config: &Config) -> io::Result<Self> {
        let addr: SocketAddr = config
            .listen
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::from_std(create_listener(addr, config.backlog)?)?;

        Ok(Server {
            listener,
            framing: config.framing,
            message_size: config.message_size,
            delimiter: config.delimiter,
        })
    }

    /// Address the server is actually bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept and serve clients until one asks to quit.
    ///
    /// Returns an error only for a fatal transport failure inside a session.
    pub async fn run(self) -> Result<(), SessionError> {
        info!(address = %self.local_addr()?, "Server listening");

        loop {
            debug!("Waiting for a connection");

            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    // accept failed, just try again
                    error!(error = %e, "Failed to accept connection");
                    continue;
                }
            };

            info!(peer = %peer, "Client connected");
            let result = self.serve(stream).await;
            info!(peer = %peer, "Client disconnected");

            match result {
                Ok(SessionOutcome::Continue) => {}
                Ok(SessionOutcome::StopServer) => break,
                Err(e) if e.is_fatal() => {
                    error!(peer = %peer, error = %e, "Fatal session error");
                    return Err(e);
                }
                Err(e) => {
                    warn!(peer = %peer, error = %e, "Session ended with error");
                }
            }
        }

        info!("Quitting");
        Ok(())
    }

    /// Run one session over an accepted stream.
    async fn serve(&self, stream: TcpStream) -> Result<SessionOutcome, SessionError> {
        let parser = self.framing.parser(self.message_size, self.delimiter);

        match self.framing {
            // One-byte receives are served from a read buffer rather than
            // one syscall per byte.
            FramingMode::DelimiterBytewise => {
                let transport = StreamTransport::new(BufReader::new(stream));
                SessionLoop::new(transport, parser).run().await
            }
            FramingMode::LengthPrefix | FramingMode::Delimiter => {
                SessionLoop::new(StreamTransport::new(stream), parser)
                    .run()
                    .await
            }
        }
    }
}

/// Create a TCP listener with SO_REUSEADDR and the configured backlog.
fn create_listener(addr: SocketAddr, backlog: u32) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;

    Ok(socket.into())
}
