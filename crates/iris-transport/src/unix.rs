//! Unix domain socket acceptor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UnixListener;
use tracing::{debug, info, warn};

use crate::acceptor::{Acceptor, ListenerSlot, NativeHandle};
use crate::error::AcceptError;
use crate::transceiver::Transceiver;

/// Accepts connections on a filesystem socket path.
///
/// The socket file is created by `listen` and unlinked by `close`.
pub struct UnixAcceptor {
    path: PathBuf,
    slot: ListenerSlot<UnixListener>,
}

impl UnixAcceptor {
    /// Create an acceptor for `path`. Nothing is bound until `listen`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: ListenerSlot::new(),
        }
    }

    /// Socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Acceptor for UnixAcceptor {
    fn native_handle(&self) -> Option<NativeHandle> {
        use std::os::fd::AsRawFd;
        self.slot.with_listener(AsRawFd::as_raw_fd)
    }

    fn close(&self) {
        if self.slot.close().is_none() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = ?self.path, error = %e, "failed to unlink unix socket");
        }
        info!(path = ?self.path, "unix acceptor closed");
    }

    async fn listen(&self) -> Result<(), AcceptError> {
        self.slot.begin_listen()?;
        let listener = match UnixListener::bind(&self.path) {
            Ok(listener) => listener,
            Err(e) => {
                self.slot.abort_listen();
                return Err(e.into());
            }
        };
        if let Err((e, _listener)) = self.slot.finish_listen(listener) {
            let _ = std::fs::remove_file(&self.path);
            return Err(e);
        }
        info!(path = ?self.path, "unix acceptor listening");
        Ok(())
    }

    async fn accept(&self, timeout: Duration) -> Result<Transceiver, AcceptError> {
        let (stream, _peer) = self
            .slot
            .accept_with(timeout, |listener| async move { listener.accept().await })
            .await?;
        debug!(path = ?self.path, "accepted unix connection");
        Ok(Transceiver::new(
            stream,
            "unix",
            format!("local address = {}", self.path.display()),
        ))
    }

    fn describe(&self) -> String {
        format!("unix -f {}", self.path.display())
    }
}

impl Drop for UnixAcceptor {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    #[tokio::test]
    async fn accepts_connection_and_unlinks_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adapter.sock");
        let acceptor = UnixAcceptor::new(&path);
        acceptor.listen().await.unwrap();
        assert!(path.exists());
        assert!(acceptor.native_handle().is_some());

        let client_path = path.clone();
        let client = tokio::spawn(async move {
            let mut stream = UnixStream::connect(client_path).await.unwrap();
            stream.write_all(b"hi").await.unwrap();
        });

        let mut transceiver = acceptor.accept(Duration::from_secs(5)).await.unwrap();
        assert_eq!(transceiver.transport(), "unix");
        let mut buf = [0u8; 2];
        transceiver.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hi");
        client.await.unwrap();

        acceptor.close();
        assert!(!path.exists());
        assert!(acceptor.native_handle().is_none());
    }

    #[tokio::test]
    async fn describe_uses_path() {
        let acceptor = UnixAcceptor::new("/tmp/iris-test.sock");
        assert_eq!(acceptor.describe(), "unix -f /tmp/iris-test.sock");
    }

    #[tokio::test]
    async fn close_before_listen_leaves_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foreign");
        std::fs::write(&path, b"").unwrap();

        let acceptor = UnixAcceptor::new(&path);
        acceptor.close();
        assert!(path.exists());
        assert_matches!(acceptor.listen().await, Err(AcceptError::Closed));
    }

    #[tokio::test]
    async fn bind_over_existing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken");
        std::fs::write(&path, b"").unwrap();

        let acceptor = UnixAcceptor::new(&path);
        assert_matches!(acceptor.listen().await, Err(AcceptError::Io(_)));
        drop(acceptor);
        assert!(path.exists());
    }
}
