//! End-to-end tests: endpoint string → acceptor → accept loop → framed client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;

use iris_settings::TransportSettings;
use iris_transport::{
    AcceptLoop, AcceptLoopConfig, ConnectionHandler, Endpoint, ShutdownCoordinator, Transceiver,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Upper-cases every line and remembers which transports it served.
#[derive(Default)]
struct Shout {
    transports: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl ConnectionHandler for Shout {
    async fn handle(&self, connection: Transceiver, shutdown: CancellationToken) {
        self.transports.lock().push(connection.transport());
        let mut framed = Framed::new(connection, LinesCodec::new());
        loop {
            let line = tokio::select! {
                () = shutdown.cancelled() => break,
                line = framed.next() => line,
            };
            match line {
                Some(Ok(line)) => {
                    if framed.send(line.to_uppercase()).await.is_err() {
                        break;
                    }
                }
                _ => break,
            }
        }
    }
}

fn config() -> AcceptLoopConfig {
    AcceptLoopConfig::from(&TransportSettings {
        accept_timeout_ms: 100,
        error_backoff_ms: 10,
        shutdown_timeout_ms: 1_000,
    })
}

async fn round_trip<S>(framed: &mut Framed<S, LinesCodec>, line: &str) -> String
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    framed.send(line).await.unwrap();
    timeout(TIMEOUT, framed.next())
        .await
        .expect("no reply")
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn tcp_endpoint_serves_framed_clients() {
    let endpoint: Endpoint = "tcp -h 127.0.0.1 -p 0".parse().unwrap();
    let handler = Arc::new(Shout::default());
    let shutdown = ShutdownCoordinator::new();

    let acceptor = endpoint.acceptor();
    let accept_loop = AcceptLoop::start(Arc::clone(&acceptor), config(), handler.clone(), &shutdown)
        .await
        .unwrap();

    let bound: Endpoint = accept_loop.describe().parse().unwrap();
    let Endpoint::Tcp { host, port } = bound else {
        panic!("expected a tcp endpoint");
    };
    assert_ne!(port, 0);

    let mut first = Framed::new(TcpStream::connect((host.as_str(), port)).await.unwrap(), LinesCodec::new());
    let mut second = Framed::new(TcpStream::connect((host.as_str(), port)).await.unwrap(), LinesCodec::new());
    assert_eq!(round_trip(&mut first, "hello").await, "HELLO");
    assert_eq!(round_trip(&mut second, "world").await, "WORLD");
    assert_eq!(round_trip(&mut first, "again").await, "AGAIN");
    assert_eq!(accept_loop.accepted(), 2);

    // open connections are told to stop and the listener goes away
    timeout(TIMEOUT, accept_loop.stop(&shutdown, Some(TIMEOUT)))
        .await
        .expect("stop hung");
    assert!(acceptor.native_handle().is_none());
    assert!(timeout(TIMEOUT, first.next()).await.unwrap().is_none());
    assert_eq!(*handler.transports.lock(), vec!["tcp", "tcp"]);
}

#[tokio::test]
async fn adapter_configured_from_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{
            "adapter": { "name": "Printer", "endpoint": "tcp -h 127.0.0.1 -p 0" },
            "transport": { "acceptTimeoutMs": 50, "shutdownTimeoutMs": 2000 }
        }"#,
    )
    .unwrap();
    let settings = iris_settings::load_settings_from_path(&path).unwrap();
    assert_eq!(settings.adapter.name, "Printer");

    let endpoint: Endpoint = settings.adapter.endpoint.parse().unwrap();
    let config = AcceptLoopConfig::from(&settings.transport);
    assert_eq!(config.accept_timeout, Duration::from_millis(50));

    let shutdown = ShutdownCoordinator::new();
    let accept_loop = AcceptLoop::start(endpoint.acceptor(), config, Arc::new(Shout::default()), &shutdown)
        .await
        .unwrap();
    // several accept timeouts elapse without ending the loop
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!accept_loop.is_finished());

    timeout(TIMEOUT, accept_loop.stop(&shutdown, Some(settings.transport.shutdown_timeout())))
        .await
        .expect("stop hung");
}

#[cfg(unix)]
#[tokio::test]
async fn unix_endpoint_serves_framed_clients() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("adapter.sock");
    let endpoint: Endpoint = format!("unix -f {}", path.display()).parse().unwrap();
    let handler = Arc::new(Shout::default());
    let shutdown = ShutdownCoordinator::new();

    let accept_loop = AcceptLoop::start(endpoint.acceptor(), config(), handler.clone(), &shutdown)
        .await
        .unwrap();
    assert_eq!(accept_loop.describe(), endpoint.to_string());

    let stream = tokio::net::UnixStream::connect(&path).await.unwrap();
    let mut client = Framed::new(stream, LinesCodec::new());
    assert_eq!(round_trip(&mut client, "ping").await, "PING");

    timeout(TIMEOUT, accept_loop.stop(&shutdown, Some(TIMEOUT)))
        .await
        .expect("stop hung");
    assert!(!path.exists());
    assert_eq!(*handler.transports.lock(), vec!["unix"]);
}
