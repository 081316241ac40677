//! Acceptor errors.

use std::time::Duration;

use thiserror::Error;

/// Outcome of a failed acceptor operation.
///
/// `Timeout` and `Cancelled` are expected by accept loops and are not
/// failures of the transport.
#[derive(Debug, Error)]
pub enum AcceptError {
    /// No connection arrived within the timeout.
    #[error("accept timed out after {0:?}")]
    Timeout(Duration),
    /// The acceptor was closed while (or before) waiting.
    #[error("accept cancelled: acceptor closed")]
    Cancelled,
    /// `accept` was called before `listen`.
    #[error("acceptor is not listening")]
    NotListening,
    /// `listen` was called more than once.
    #[error("acceptor is already listening")]
    AlreadyListening,
    /// `listen` was called after `close`.
    #[error("acceptor is closed")]
    Closed,
    /// The underlying socket failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AcceptError {
    /// Whether the wait simply timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Whether the acceptor was closed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
