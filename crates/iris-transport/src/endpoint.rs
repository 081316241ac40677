//! Textual endpoint descriptions.
//!
//! Grammar: `<transport> [-option value]...`
//! - `tcp -h <host> -p <port>` (`default` is an alias of `tcp`; host defaults
//!   to `127.0.0.1`, port to `0`)
//! - `unix -f <path>`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::acceptor::Acceptor;
use crate::tcp::TcpAcceptor;

/// Where an adapter listens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// A TCP host/port.
    Tcp {
        /// Host name or address.
        host: String,
        /// Port, `0` for ephemeral.
        port: u16,
    },
    /// A unix domain socket path.
    #[cfg(unix)]
    Unix {
        /// Socket path.
        path: PathBuf,
    },
}

impl Endpoint {
    /// Build an acceptor for this endpoint. The acceptor is not yet listening.
    pub fn acceptor(&self) -> Arc<dyn Acceptor> {
        match self {
            Self::Tcp { host, port } => Arc::new(TcpAcceptor::new(host.clone(), *port)),
            #[cfg(unix)]
            Self::Unix { path } => Arc::new(crate::unix::UnixAcceptor::new(path.clone())),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "tcp -h {host} -p {port}"),
            #[cfg(unix)]
            Self::Unix { path } => write!(f, "unix -f {}", path.display()),
        }
    }
}

/// Failure to parse an [`Endpoint`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EndpointParseError {
    /// Nothing to parse.
    #[error("empty endpoint")]
    Empty,
    /// The leading transport name is not supported.
    #[error("unknown transport `{0}`")]
    UnknownTransport(String),
    /// An option the transport does not accept.
    #[error("unknown option `{option}` for {transport} endpoint")]
    UnknownOption {
        /// Transport name.
        transport: String,
        /// The offending option.
        option: String,
    },
    /// An option without its argument.
    #[error("option `{0}` requires an argument")]
    MissingArgument(String),
    /// The port is not a valid `u16`.
    #[error("invalid port `{0}`")]
    InvalidPort(String),
    /// A unix endpoint without `-f`.
    #[error("unix endpoint requires `-f <path>`")]
    MissingPath,
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let transport = tokens.next().ok_or(EndpointParseError::Empty)?;
        let options = parse_options(transport, tokens)?;

        match transport {
            "tcp" | "default" => {
                let mut host = "127.0.0.1".to_string();
                let mut port = 0;
                for (option, value) in options {
                    match option {
                        "-h" => host = value.to_string(),
                        "-p" => {
                            port = value
                                .parse()
                                .map_err(|_| EndpointParseError::InvalidPort(value.to_string()))?;
                        }
                        other => return Err(unknown_option(transport, other)),
                    }
                }
                Ok(Self::Tcp { host, port })
            }
            #[cfg(unix)]
            "unix" => {
                let mut path = None;
                for (option, value) in options {
                    match option {
                        "-f" => path = Some(PathBuf::from(value)),
                        other => return Err(unknown_option(transport, other)),
                    }
                }
                path.map(|path| Self::Unix { path })
                    .ok_or(EndpointParseError::MissingPath)
            }
            other => Err(EndpointParseError::UnknownTransport(other.to_string())),
        }
    }
}

fn parse_options<'a>(
    transport: &str,
    mut tokens: impl Iterator<Item = &'a str>,
) -> Result<Vec<(&'a str, &'a str)>, EndpointParseError> {
    let mut options = Vec::new();
    while let Some(option) = tokens.next() {
        if !option.starts_with('-') {
            return Err(unknown_option(transport, option));
        }
        let value = tokens
            .next()
            .ok_or_else(|| EndpointParseError::MissingArgument(option.to_string()))?;
        options.push((option, value));
    }
    Ok(options)
}

fn unknown_option(transport: &str, option: &str) -> EndpointParseError {
    EndpointParseError::UnknownOption {
        transport: transport.to_string(),
        option: option.to_string(),
    }
}
