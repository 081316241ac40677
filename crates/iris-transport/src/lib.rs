//! # iris-transport
//!
//! Transport-agnostic connection acceptance.
//!
//! - [`Acceptor`]: the listen/accept/close contract every transport implements
//! - [`TcpAcceptor`] and (on unix) [`UnixAcceptor`] variants
//! - [`Transceiver`]: an accepted duplex byte stream
//! - [`Endpoint`]: textual endpoint descriptions (`tcp -h host -p port`)
//! - [`AcceptLoop`]: the connection manager driving an acceptor until shutdown

#![deny(unsafe_code)]

pub mod accept_loop;
pub mod acceptor;
pub mod endpoint;
pub mod error;
pub mod shutdown;
pub mod tcp;
pub mod transceiver;
#[cfg(unix)]
pub mod unix;

pub use accept_loop::{AcceptLoop, AcceptLoopConfig, ConnectionHandler};
pub use acceptor::{Acceptor, NativeHandle};
pub use endpoint::{Endpoint, EndpointParseError};
pub use error::AcceptError;
pub use shutdown::ShutdownCoordinator;
pub use tcp::TcpAcceptor;
pub use transceiver::{DuplexStream, Transceiver};
#[cfg(unix)]
pub use unix::UnixAcceptor;
