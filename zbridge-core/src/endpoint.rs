//! Endpoint parsing and relay address synthesis.
//!
//! Bridges validate their endpoint before touching the transport, and derive
//! the private in-process relay address from the endpoint and socket kind.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::socket_type::SocketKind;

/// Scheme prefix of every relay address.
pub const RELAY_PREFIX: &str = "inproc://zbridge-relay/";

/// Transport endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// TCP transport: `tcp://host:port`.
    ///
    /// The host may be an interface name, a hostname, an IPv6 literal in
    /// brackets or `*`. The port may be `*` to let the transport pick one.
    Tcp {
        /// Host or interface part.
        host: String,
        /// Port, `None` for `*`.
        port: Option<u16>,
    },
    /// IPC transport (Unix domain socket): `ipc:///path/to/socket`
    #[cfg(unix)]
    Ipc(PathBuf),
    /// In-process transport: `inproc://name`
    Inproc(String),
}

impl Endpoint {
    /// Parse an endpoint from a string.
    ///
    /// Supported formats:
    /// - `tcp://127.0.0.1:5555`
    /// - `tcp://*:5555`, `tcp://127.0.0.1:*`
    /// - `tcp://[::1]:5555` (IPv6)
    /// - `ipc:///tmp/socket.sock` (Unix only)
    /// - `inproc://name`
    ///
    /// # Examples
    ///
    /// ```
    /// use zbridge_core::endpoint::Endpoint;
    ///
    /// let endpoint = Endpoint::parse("tcp://127.0.0.1:5555").unwrap();
    /// assert!(endpoint.is_tcp());
    ///
    /// let endpoint = Endpoint::parse("inproc://my-endpoint").unwrap();
    /// assert!(endpoint.is_inproc());
    /// ```
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        s.parse()
    }

    /// Returns true if this is a TCP endpoint.
    pub fn is_tcp(&self) -> bool {
        matches!(self, Endpoint::Tcp { .. })
    }

    /// Returns true if this is an IPC endpoint.
    #[cfg(unix)]
    pub fn is_ipc(&self) -> bool {
        matches!(self, Endpoint::Ipc(_))
    }

    /// Returns true if this is an inproc endpoint.
    pub fn is_inproc(&self) -> bool {
        matches!(self, Endpoint::Inproc(_))
    }
}

fn parse_tcp(addr: &str) -> Result<Endpoint, EndpointError> {
    let invalid = || EndpointError::InvalidTcpAddress(addr.to_string());
    let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    let port = match port {
        "*" => None,
        p => Some(p.parse::<u16>().map_err(|_| invalid())?),
    };
    Ok(Endpoint::Tcp {
        host: host.to_string(),
        port,
    })
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(addr) = s.strip_prefix("tcp://") {
            parse_tcp(addr)
        } else if let Some(path) = s.strip_prefix("ipc://") {
            #[cfg(unix)]
            {
                if path.is_empty() {
                    return Err(EndpointError::InvalidIpcPath(s.to_string()));
                }
                Ok(Endpoint::Ipc(PathBuf::from(path)))
            }
            #[cfg(not(unix))]
            {
                let _ = path;
                Err(EndpointError::IpcNotSupported)
            }
        } else if let Some(name) = s.strip_prefix("inproc://") {
            if name.is_empty() {
                Err(EndpointError::InvalidInprocName(
                    "inproc name cannot be empty".to_string(),
                ))
            } else {
                Ok(Endpoint::Inproc(name.to_string()))
            }
        } else {
            Err(EndpointError::InvalidScheme(s.to_string()))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { host, port: Some(p) } => write!(f, "tcp://{host}:{p}"),
            Endpoint::Tcp { host, port: None } => write!(f, "tcp://{host}:*"),
            #[cfg(unix)]
            Endpoint::Ipc(path) => write!(f, "ipc://{}", path.display()),
            Endpoint::Inproc(name) => write!(f, "inproc://{name}"),
        }
    }
}

/// Derive the private relay address for one bridge.
///
/// The address is a pure function of the socket kind, the endpoint and the
/// bridge sequence number, so two live bridges never share a relay even when
/// they use the same kind and endpoint.
///
/// ```
/// use zbridge_core::endpoint::{relay_address, Endpoint};
/// use zbridge_core::socket_type::SocketKind;
///
/// let ep = Endpoint::parse("tcp://127.0.0.1:5555").unwrap();
/// assert_eq!(
///     relay_address(SocketKind::Req, &ep, 7),
///     "inproc://zbridge-relay/req/tcp://127.0.0.1:5555#7"
/// );
/// ```
pub fn relay_address(kind: SocketKind, endpoint: &Endpoint, bridge_id: u64) -> String {
    format!(
        "{RELAY_PREFIX}{}/{endpoint}#{bridge_id}",
        kind.as_str().to_ascii_lowercase()
    )
}

/// Errors that can occur when parsing or using endpoints.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Invalid scheme in endpoint: {0} (expected tcp://, ipc://, or inproc://)")]
    InvalidScheme(String),

    #[error("Invalid TCP address: {0}")]
    InvalidTcpAddress(String),

    #[error("Invalid IPC path: {0}")]
    InvalidIpcPath(String),

    #[error("Invalid inproc name: {0}")]
    InvalidInprocName(String),

    #[error("IPC transport not supported on this platform")]
    IpcNotSupported,
}
