//! Bridge error types.
//!
//! One enum covers the whole taxonomy: construction failures
//! (`InvalidEndpoint`, `Socket`, `Connection`, `Spawn`) are reported once on a
//! bridge's error queue, transfer and poll failures end whichever loop hit
//! them, and the remaining variants are returned synchronously by the API.

use std::io;
use thiserror::Error;
use zbridge_core::endpoint::EndpointError;
use zbridge_core::socket_type::SocketKind;

/// Main error type for bridge operations
#[derive(Error, Debug)]
pub enum Error {
    /// The endpoint string could not be parsed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] EndpointError),

    /// Creating a socket or applying an option failed
    #[error("Socket error: {0}")]
    Socket(#[source] zmq::Error),

    /// Bind, connect or relay setup failed
    #[error("Connection error on {endpoint}: {source}")]
    Connection {
        /// Address the operation targeted.
        endpoint: String,
        /// Transport error.
        source: zmq::Error,
    },

    /// A send or receive failed
    #[error("Transfer error: {0}")]
    Transfer(#[source] zmq::Error),

    /// The readiness poll failed
    #[error("Poll error: {0}")]
    Poll(#[source] zmq::Error),

    /// `close` was called on a frame that is already released
    #[error("Frame already released")]
    FrameReleased,

    /// A multipart message must carry at least one frame
    #[error("Cannot send an empty multipart message")]
    EmptyMessage,

    /// The bridge's socket kind never sends
    #[error("{0} sockets cannot send")]
    SendNotSupported(SocketKind),

    /// A relay message did not start with a known tag
    #[error("Relay protocol error: {0}")]
    Relay(&'static str),

    /// A monitor event could not be decoded
    #[error("Monitor error: {0}")]
    Monitor(String),

    /// A worker thread could not be started
    #[error("Failed to spawn bridge worker: {0}")]
    Spawn(#[source] io::Error),

    /// A worker thread panicked
    #[error("Bridge worker panicked")]
    WorkerPanicked,

    /// The queue on the other side is gone
    #[error("Bridge closed")]
    Closed,

    /// A non-blocking enqueue found the outbound queue full
    #[error("Outbound queue full")]
    QueueFull,

    /// A timed receive expired
    #[error("Timed out")]
    Timeout,
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a connection error for `endpoint`.
    pub fn connection(endpoint: impl Into<String>, source: zmq::Error) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Check if this error belongs to bridge construction
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEndpoint(_) | Self::Socket(_) | Self::Connection { .. } | Self::Spawn(_)
        )
    }

    /// Check if this is a send or receive failure
    #[must_use]
    pub const fn is_transfer_error(&self) -> bool {
        matches!(self, Self::Transfer(_) | Self::Relay(_))
    }

    /// Check if the underlying transport call was interrupted.
    ///
    /// Interrupted calls are retried internally, so this only ever holds for
    /// errors built by hand.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self.transport_error(), Some(zmq::Error::EINTR))
    }

    /// The transport error carried by this error, if any.
    #[must_use]
    pub fn transport_error(&self) -> Option<zmq::Error> {
        match self {
            Self::Socket(e) | Self::Transfer(e) | Self::Poll(e) => Some(*e),
            Self::Connection { source, .. } => Some(*source),
            _ => None,
        }
    }
}
