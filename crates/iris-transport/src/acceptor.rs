//! The acceptor contract shared by all transports.
//!
//! Lifecycle: `listen` exactly once, then any number of `accept` calls, then
//! `close`. `close` is idempotent and may happen at any point; it wakes every
//! pending `accept` with [`AcceptError::Cancelled`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::AcceptError;
use crate::transceiver::Transceiver;

/// OS handle of a listening socket, for external poll integration.
#[cfg(unix)]
pub type NativeHandle = std::os::fd::RawFd;

/// OS handle of a listening socket, for external poll integration.
#[cfg(windows)]
pub type NativeHandle = std::os::windows::io::RawSocket;

/// A listening endpoint producing [`Transceiver`]s.
#[async_trait]
pub trait Acceptor: Send + Sync {
    /// Handle of the listening socket; `None` before `listen` or after `close`.
    fn native_handle(&self) -> Option<NativeHandle>;

    /// Stop listening and wake any pending `accept`. Idempotent.
    fn close(&self);

    /// Start listening. Must be called once, before the first `accept`.
    async fn listen(&self) -> Result<(), AcceptError>;

    /// Wait up to `timeout` for the next established connection.
    async fn accept(&self, timeout: Duration) -> Result<Transceiver, AcceptError>;

    /// Human-readable endpoint, e.g. `tcp -h 127.0.0.1 -p 4061`.
    fn describe(&self) -> String;
}

enum SlotState<L> {
    Unbound,
    Binding,
    Listening(Arc<L>),
    Closed,
}

/// Listener lifecycle shared by the concrete acceptors.
pub(crate) struct ListenerSlot<L> {
    state: Mutex<SlotState<L>>,
    closed: CancellationToken,
}

impl<L> ListenerSlot<L> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Unbound),
            closed: CancellationToken::new(),
        }
    }

    /// Reserve the slot before binding, so a concurrent second `listen` fails fast.
    pub(crate) fn begin_listen(&self) -> Result<(), AcceptError> {
        let mut state = self.state.lock();
        match *state {
            SlotState::Unbound => {
                *state = SlotState::Binding;
                Ok(())
            }
            SlotState::Binding | SlotState::Listening(_) => Err(AcceptError::AlreadyListening),
            SlotState::Closed => Err(AcceptError::Closed),
        }
    }

    /// Install the bound listener. Fails with `Closed` if `close` raced the bind,
    /// in which case the listener is handed back for cleanup.
    pub(crate) fn finish_listen(&self, listener: L) -> Result<(), (AcceptError, L)> {
        let mut state = self.state.lock();
        match *state {
            SlotState::Binding => {
                *state = SlotState::Listening(Arc::new(listener));
                Ok(())
            }
            SlotState::Closed => Err((AcceptError::Closed, listener)),
            SlotState::Unbound | SlotState::Listening(_) => {
                Err((AcceptError::AlreadyListening, listener))
            }
        }
    }

    /// Release the reservation after a failed bind.
    pub(crate) fn abort_listen(&self) {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Binding) {
            *state = SlotState::Unbound;
        }
    }

    /// Mark closed and return the listener, if one was installed.
    pub(crate) fn close(&self) -> Option<Arc<L>> {
        self.closed.cancel();
        let previous = std::mem::replace(&mut *self.state.lock(), SlotState::Closed);
        match previous {
            SlotState::Listening(listener) => Some(listener),
            _ => None,
        }
    }

    pub(crate) fn with_listener<R>(&self, f: impl FnOnce(&L) -> R) -> Option<R> {
        match &*self.state.lock() {
            SlotState::Listening(listener) => Some(f(listener)),
            _ => None,
        }
    }

    /// Run one accept attempt against the installed listener, bounded by
    /// `timeout` and by `close`.
    pub(crate) async fn accept_with<T, F, Fut>(
        &self,
        timeout: Duration,
        accept: F,
    ) -> Result<T, AcceptError>
    where
        F: FnOnce(Arc<L>) -> Fut,
        Fut: Future<Output = std::io::Result<T>>,
    {
        let listener = match &*self.state.lock() {
            SlotState::Listening(listener) => Arc::clone(listener),
            SlotState::Closed => return Err(AcceptError::Cancelled),
            SlotState::Unbound | SlotState::Binding => return Err(AcceptError::NotListening),
        };

        tokio::select! {
            biased;
            () = self.closed.cancelled() => Err(AcceptError::Cancelled),
            accepted = accept(listener) => Ok(accepted?),
            () = tokio::time::sleep(timeout) => Err(AcceptError::Timeout(timeout)),
        }
    }
}
