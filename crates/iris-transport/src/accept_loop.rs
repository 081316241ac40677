//! Connection manager: drives one [`Acceptor`] until shutdown.
//!
//! `listen` runs once in [`AcceptLoop::start`]; the spawned loop then calls
//! `accept` repeatedly and hands every [`Transceiver`] to a
//! [`ConnectionHandler`] on its own task. Shutdown closes the acceptor, which
//! wakes the pending `accept`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use iris_settings::TransportSettings;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::acceptor::Acceptor;
use crate::error::AcceptError;
use crate::shutdown::ShutdownCoordinator;
use crate::transceiver::Transceiver;

/// Consumer of accepted connections, typically the framing layer.
#[async_trait]
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Serve one connection. `shutdown` resolves when the adapter stops.
    async fn handle(&self, connection: Transceiver, shutdown: CancellationToken);
}

/// Timing knobs for [`AcceptLoop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcceptLoopConfig {
    /// Upper bound of one `accept` wait.
    pub accept_timeout: Duration,
    /// Pause after an `accept` failure other than timeout or cancellation.
    pub error_backoff: Duration,
}

impl Default for AcceptLoopConfig {
    fn default() -> Self {
        Self::from(&TransportSettings::default())
    }
}

impl From<&TransportSettings> for AcceptLoopConfig {
    fn from(settings: &TransportSettings) -> Self {
        Self {
            accept_timeout: settings.accept_timeout(),
            error_backoff: settings.error_backoff(),
        }
    }
}

/// A running accept loop.
pub struct AcceptLoop {
    acceptor: Arc<dyn Acceptor>,
    task: JoinHandle<()>,
    connections: Arc<Mutex<Vec<JoinHandle<()>>>>,
    accepted: Arc<AtomicU64>,
    active: Arc<AtomicU64>,
}

impl AcceptLoop {
    /// Put `acceptor` into listening state and start accepting.
    ///
    /// Fails if `listen` fails; nothing is spawned in that case.
    pub async fn start(
        acceptor: Arc<dyn Acceptor>,
        config: AcceptLoopConfig,
        handler: Arc<dyn ConnectionHandler>,
        shutdown: &ShutdownCoordinator,
    ) -> Result<Self, AcceptError> {
        acceptor.listen().await?;
        info!(endpoint = %acceptor.describe(), "accepting connections");

        let connections = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicU64::new(0));
        let active = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(run(
            Arc::clone(&acceptor),
            config,
            handler,
            shutdown.token(),
            Arc::clone(&connections),
            Arc::clone(&accepted),
            Arc::clone(&active),
        ));

        Ok(Self {
            acceptor,
            task,
            connections,
            accepted,
            active,
        })
    }

    /// Number of connections accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Number of connection handlers still running.
    pub fn active(&self) -> u64 {
        self.active.load(Ordering::Relaxed)
    }

    /// Endpoint of the underlying acceptor.
    pub fn describe(&self) -> String {
        self.acceptor.describe()
    }

    /// Whether the loop task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop accepting, then wait up to `timeout` for connection tasks.
    pub async fn stop(self, shutdown: &ShutdownCoordinator, timeout: Option<Duration>) {
        shutdown.shutdown();
        self.acceptor.close();
        if let Err(e) = self.task.await {
            warn!(error = %e, "accept loop task failed");
        }
        let handles = std::mem::take(&mut *self.connections.lock());
        shutdown.graceful_shutdown(handles, timeout).await;
    }
}

async fn run(
    acceptor: Arc<dyn Acceptor>,
    config: AcceptLoopConfig,
    handler: Arc<dyn ConnectionHandler>,
    shutdown: CancellationToken,
    connections: Arc<Mutex<Vec<JoinHandle<()>>>>,
    accepted: Arc<AtomicU64>,
    active: Arc<AtomicU64>,
) {
    let endpoint = acceptor.describe();
    loop {
        let result = tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                acceptor.close();
                break;
            }
            result = acceptor.accept(config.accept_timeout) => result,
        };

        match result {
            Ok(connection) => {
                let _ = accepted.fetch_add(1, Ordering::Relaxed);
                debug!(%endpoint, connection = connection.describe(), "connection accepted");
                let handler = Arc::clone(&handler);
                let token = shutdown.child_token();
                let transport = connection.transport();
                counter!("iris_connections_accepted_total", "transport" => transport).increment(1);
                let guard = ActiveConnection::new(Arc::clone(&active));
                let handle = tokio::spawn(async move {
                    let _guard = guard;
                    handler.handle(connection, token).await;
                });
                let mut connections = connections.lock();
                connections.retain(|h| !h.is_finished());
                connections.push(handle);
            }
            Err(e) if e.is_timeout() => {}
            Err(e) if e.is_cancelled() => break,
            Err(e) => {
                counter!("iris_accept_errors_total").increment(1);
                warn!(%endpoint, error = %e, "accept failed");
                tokio::select! {
                    () = shutdown.cancelled() => {
                        acceptor.close();
                        break;
                    }
                    () = tokio::time::sleep(config.error_backoff) => {}
                }
            }
        }
    }
    info!(%endpoint, "accept loop stopped");
}

/// One running connection handler. Dropped with the handler's future, so a
/// panicking or aborted handler is still counted out.
struct ActiveConnection {
    active: Arc<AtomicU64>,
}

impl ActiveConnection {
    fn new(active: Arc<AtomicU64>) -> Self {
        let _ = active.fetch_add(1, Ordering::Relaxed);
        gauge!("iris_connections_active").increment(1.0);
        Self { active }
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        let _ = self.active.fetch_sub(1, Ordering::Relaxed);
        gauge!("iris_connections_active").decrement(1.0);
    }
}
