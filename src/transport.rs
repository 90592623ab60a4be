//! Byte-stream transport consumed by the session loop.
//!
//! The session only needs two operations: receive up to N bytes and send a
//! buffer. `StreamTransport` provides them over any tokio stream (a
//! `TcpStream`, a `BufReader` around one, or a test mock).

use bytes::{Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A connected byte stream for one client.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Receive at most `max_bytes`.
    ///
    /// An empty result means the peer closed the connection.
    async fn receive(&mut self, max_bytes: usize) -> io::Result<Bytes>;

    /// Send `data` with a single write, returning the bytes accepted.
    async fn send(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Release the connection.
    async fn close(&mut self) -> io::Result<()>;
}

/// `Transport` over a tokio stream.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
}

impl<S> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn receive(&mut self, max_bytes: usize) -> io::Result<Bytes> {
        let mut buffer = BytesMut::zeroed(max_bytes);
        let n = self.stream.read(&mut buffer[..]).await?;
        buffer.truncate(n);
        Ok(buffer.freeze())
    }

    async fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.stream.write(data).await?;
        self.stream.flush().await?;
        Ok(n)
    }

    async fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}
