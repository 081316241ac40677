//! TCP acceptor.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, info};

use crate::acceptor::{Acceptor, ListenerSlot, NativeHandle};
use crate::error::AcceptError;
use crate::transceiver::Transceiver;

/// Pending-connection queue length passed to `listen(2)`.
const LISTEN_BACKLOG: u32 = 1024;

/// Accepts TCP connections on one host/port.
pub struct TcpAcceptor {
    host: String,
    port: u16,
    slot: ListenerSlot<TcpListener>,
}

impl TcpAcceptor {
    /// Create an acceptor for `host:port`. Nothing is bound until `listen`.
    ///
    /// Port `0` picks an ephemeral port; [`Self::local_addr`] reports it.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            slot: ListenerSlot::new(),
        }
    }

    /// Bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.slot.with_listener(|l| l.local_addr().ok()).flatten()
    }

    async fn bind(&self) -> std::io::Result<TcpListener> {
        let addr = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("host `{}` did not resolve", self.host),
                )
            })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        #[cfg(unix)]
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        socket.listen(LISTEN_BACKLOG)
    }
}

#[async_trait]
impl Acceptor for TcpAcceptor {
    fn native_handle(&self) -> Option<NativeHandle> {
        #[cfg(unix)]
        {
            use std::os::fd::AsRawFd;
            self.slot.with_listener(AsRawFd::as_raw_fd)
        }
        #[cfg(windows)]
        {
            use std::os::windows::io::AsRawSocket;
            self.slot.with_listener(AsRawSocket::as_raw_socket)
        }
    }

    fn close(&self) {
        let endpoint = self.describe();
        if self.slot.close().is_some() {
            info!(%endpoint, "tcp acceptor closed");
        }
    }

    async fn listen(&self) -> Result<(), AcceptError> {
        self.slot.begin_listen()?;
        let listener = match self.bind().await {
            Ok(listener) => listener,
            Err(e) => {
                self.slot.abort_listen();
                return Err(e.into());
            }
        };
        let local = listener.local_addr().ok();
        self.slot.finish_listen(listener).map_err(|(e, _)| e)?;
        info!(host = %self.host, local = ?local, "tcp acceptor listening");
        Ok(())
    }

    async fn accept(&self, timeout: Duration) -> Result<Transceiver, AcceptError> {
        let (stream, peer) = self
            .slot
            .accept_with(timeout, |listener| async move { listener.accept().await })
            .await?;
        stream.set_nodelay(true)?;
        let local = stream.local_addr()?;
        debug!(%local, %peer, "accepted tcp connection");
        Ok(Transceiver::new(
            stream,
            "tcp",
            format!("local address = {local}, remote address = {peer}"),
        ))
    }

    fn describe(&self) -> String {
        let port = self.local_addr().map_or(self.port, |a| a.port());
        format!("tcp -h {} -p {port}", self.host)
    }
}

impl Drop for TcpAcceptor {
    fn drop(&mut self) {
        let _ = self.slot.close();
    }
}
