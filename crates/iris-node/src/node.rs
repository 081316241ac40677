//! A running object adapter: servant registry plus accept loop.
//!
//! Connections speak a line protocol. Each request line names a target as
//! `<identity>` or `<identity> -f <facet>`; the reply is one of
//! `found <interface>`, `facet-not-found`, `object-not-found` or
//! `error <message>`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use iris_adapter::{Current, Resolution, Servant, ServantRegistry, resolve};
use iris_core::{DEFAULT_FACET, Identity};
use iris_settings::IrisSettings;
use iris_transport::{
    AcceptLoop, AcceptLoopConfig, ConnectionHandler, Endpoint, ShutdownCoordinator, Transceiver,
};
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Longest accepted request line.
const MAX_LINE: usize = 4096;

/// Operation name recorded in [`Current`] for target lookups.
const LOCATE: &str = "locate";

/// Identity of the servant every node registers for itself.
pub fn admin_identity() -> Identity {
    Identity::new("admin", "iris")
}

struct Admin;

impl Servant for Admin {
    fn interface_id(&self) -> &str {
        "::Iris::Admin"
    }
}

/// An adapter accepting connections on its configured endpoint.
pub struct Node {
    registry: Arc<ServantRegistry>,
    shutdown: ShutdownCoordinator,
    accept_loop: AcceptLoop,
    shutdown_timeout: Duration,
}

impl Node {
    /// Build the registry for `settings.adapter.name`, register the admin
    /// servant and start accepting on `settings.adapter.endpoint`.
    pub async fn start(settings: &IrisSettings) -> anyhow::Result<Self> {
        let endpoint: Endpoint = settings
            .adapter
            .endpoint
            .parse()
            .with_context(|| format!("invalid endpoint `{}`", settings.adapter.endpoint))?;

        let registry = Arc::new(ServantRegistry::new(settings.adapter.name.clone()));
        registry.add_servant(Arc::new(Admin), &admin_identity(), DEFAULT_FACET)?;

        let shutdown = ShutdownCoordinator::new();
        let handler = Arc::new(LocateHandler {
            registry: Arc::clone(&registry),
        });
        let accept_loop = AcceptLoop::start(
            endpoint.acceptor(),
            AcceptLoopConfig::from(&settings.transport),
            handler,
            &shutdown,
        )
        .await
        .with_context(|| format!("failed to listen on `{endpoint}`"))?;

        info!(
            adapter = registry.adapter_name(),
            endpoint = %accept_loop.describe(),
            "adapter started"
        );
        Ok(Self {
            registry,
            shutdown,
            accept_loop,
            shutdown_timeout: settings.transport.shutdown_timeout(),
        })
    }

    /// Servant registry of this adapter.
    pub fn registry(&self) -> &Arc<ServantRegistry> {
        &self.registry
    }

    /// Bound endpoint.
    pub fn describe(&self) -> String {
        self.accept_loop.describe()
    }

    /// Stop accepting, wait for connections, then destroy the registry.
    pub async fn stop(self) {
        self.accept_loop
            .stop(&self.shutdown, Some(self.shutdown_timeout))
            .await;
        self.registry.destroy();
        info!(adapter = self.registry.adapter_name(), "adapter stopped");
    }
}

struct LocateHandler {
    registry: Arc<ServantRegistry>,
}

impl LocateHandler {
    fn answer(&self, line: &str) -> String {
        let (target, facet) = match line.split_once(" -f ") {
            Some((target, facet)) => (target, facet),
            None => (line, DEFAULT_FACET),
        };
        let identity: Identity = match target.trim().parse() {
            Ok(identity) => identity,
            Err(e) => return format!("error {e}"),
        };

        let current =
            Current::new(self.registry.adapter_name(), identity, LOCATE).with_facet(facet.trim());
        let resolution = match resolve(&self.registry, &current) {
            Ok(resolution) => resolution,
            Err(e) => return format!("error {e}"),
        };
        let reply = match &resolution {
            Resolution::FacetNotFound => "facet-not-found".to_string(),
            Resolution::ObjectNotFound => "object-not-found".to_string(),
            found => match found.servant() {
                Some(servant) => format!("found {}", servant.interface_id()),
                None => "object-not-found".to_string(),
            },
        };
        resolution.finish(&current);
        reply
    }
}

#[async_trait]
impl ConnectionHandler for LocateHandler {
    async fn handle(&self, connection: Transceiver, shutdown: CancellationToken) {
        let peer = connection.describe().to_string();
        let mut framed = Framed::new(connection, LinesCodec::new_with_max_length(MAX_LINE));
        loop {
            let line = tokio::select! {
                () = shutdown.cancelled() => break,
                line = framed.next() => line,
            };
            let line = match line {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    warn!(%peer, error = %e, "dropping connection after bad request");
                    break;
                }
                None => break,
            };
            let reply = self.answer(&line);
            debug!(%peer, request = %line, %reply, "request served");
            if framed.send(reply).await.is_err() {
                break;
            }
        }
    }
}
