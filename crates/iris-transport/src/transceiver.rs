//! Accepted duplex byte streams.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Any bidirectional async byte stream a transport can hand out.
pub trait DuplexStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> DuplexStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// An established connection, ready for the framing layer.
pub struct Transceiver {
    stream: Box<dyn DuplexStream>,
    transport: &'static str,
    description: String,
}

impl Transceiver {
    /// Wrap an established stream.
    pub fn new(
        stream: impl DuplexStream,
        transport: &'static str,
        description: impl Into<String>,
    ) -> Self {
        Self {
            stream: Box::new(stream),
            transport,
            description: description.into(),
        }
    }

    /// Transport tag, e.g. `"tcp"` or `"unix"`.
    pub fn transport(&self) -> &'static str {
        self.transport
    }

    /// Local and remote addresses, for diagnostics.
    pub fn describe(&self) -> &str {
        &self.description
    }

    /// Unwrap the underlying stream.
    pub fn into_stream(self) -> Box<dyn DuplexStream> {
        self.stream
    }
}

impl fmt::Debug for Transceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transceiver")
            .field("transport", &self.transport)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for Transceiver {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.get_mut().stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for Transceiver {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut *self.get_mut().stream).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.get_mut().stream).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.get_mut().stream).poll_shutdown(cx)
    }
}
