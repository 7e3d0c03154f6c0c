//! Socket event monitoring.
//!
//! [`Socket::monitor`](crate::Socket::monitor) makes the transport publish
//! lifecycle events for a socket on an in-process PAIR endpoint. Connect a
//! PAIR socket to that endpoint and call [`read_event`] to consume them.
//!
//! Each event is a two-frame message: a six-byte header holding the event id
//! (`u16`, little endian) and an event value (`u32`, little endian), then
//! the affected endpoint.

use std::fmt;
use std::ops::BitOr;

use crate::error::{Error, Result};
use crate::pool::FramePool;
use crate::socket::Socket;

// `zmq::SocketEvent::from_raw` panics on ids it does not know, so incoming
// ids are looked up here instead.
const KNOWN_EVENTS: [zmq::SocketEvent; 11] = [
    zmq::SocketEvent::CONNECTED,
    zmq::SocketEvent::CONNECT_DELAYED,
    zmq::SocketEvent::CONNECT_RETRIED,
    zmq::SocketEvent::LISTENING,
    zmq::SocketEvent::BIND_FAILED,
    zmq::SocketEvent::ACCEPTED,
    zmq::SocketEvent::ACCEPT_FAILED,
    zmq::SocketEvent::CLOSED,
    zmq::SocketEvent::CLOSE_FAILED,
    zmq::SocketEvent::DISCONNECTED,
    zmq::SocketEvent::MONITOR_STOPPED,
];

fn lookup(id: u16) -> Option<zmq::SocketEvent> {
    KNOWN_EVENTS.into_iter().find(|event| event.to_raw() == id)
}

/// Set of events to subscribe a monitor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorEvents(u16);

impl MonitorEvents {
    /// Outgoing connection established.
    pub const CONNECTED: Self = Self(zmq::SocketEvent::CONNECTED as u16);
    /// Outgoing connection pending.
    pub const CONNECT_DELAYED: Self = Self(zmq::SocketEvent::CONNECT_DELAYED as u16);
    /// Outgoing connection being retried.
    pub const CONNECT_RETRIED: Self = Self(zmq::SocketEvent::CONNECT_RETRIED as u16);
    /// Bound and listening.
    pub const LISTENING: Self = Self(zmq::SocketEvent::LISTENING as u16);
    /// Bind failed.
    pub const BIND_FAILED: Self = Self(zmq::SocketEvent::BIND_FAILED as u16);
    /// Incoming connection accepted.
    pub const ACCEPTED: Self = Self(zmq::SocketEvent::ACCEPTED as u16);
    /// Incoming connection rejected.
    pub const ACCEPT_FAILED: Self = Self(zmq::SocketEvent::ACCEPT_FAILED as u16);
    /// Connection closed.
    pub const CLOSED: Self = Self(zmq::SocketEvent::CLOSED as u16);
    /// Connection close failed.
    pub const CLOSE_FAILED: Self = Self(zmq::SocketEvent::CLOSE_FAILED as u16);
    /// Peer went away.
    pub const DISCONNECTED: Self = Self(zmq::SocketEvent::DISCONNECTED as u16);
    /// The monitor itself stopped.
    pub const MONITOR_STOPPED: Self = Self(zmq::SocketEvent::MONITOR_STOPPED as u16);
    /// Every event.
    pub const ALL: Self = Self(zmq::SocketEvent::ALL as u16);

    /// Raw event mask.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns true if every event in `other` is also in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MonitorEvents {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Socket lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Socket successfully connected to a peer.
    Connected(String),

    /// Connection attempt is in progress.
    ConnectDelayed(String),

    /// Connection attempt will be retried.
    ConnectRetried {
        /// Endpoint being dialled.
        endpoint: String,
        /// Milliseconds until the next attempt.
        interval_ms: u32,
    },

    /// Socket is listening for incoming connections.
    Listening(String),

    /// Bind operation failed.
    BindFailed {
        /// Endpoint that could not be bound.
        endpoint: String,
        /// Transport errno.
        errno: u32,
    },

    /// Socket accepted a new incoming connection.
    Accepted(String),

    /// Incoming connection could not be accepted.
    AcceptFailed {
        /// Listening endpoint.
        endpoint: String,
        /// Transport errno.
        errno: u32,
    },

    /// Connection closed.
    Closed(String),

    /// Connection could not be closed cleanly.
    CloseFailed {
        /// Affected endpoint.
        endpoint: String,
        /// Transport errno.
        errno: u32,
    },

    /// Socket disconnected from a peer.
    Disconnected(String),

    /// The monitor stopped publishing.
    MonitorStopped,

    /// Event id this crate does not know.
    Unknown {
        /// Raw event id.
        id: u16,
        /// Raw event value.
        value: u32,
        /// Affected endpoint.
        endpoint: String,
    },
}

impl SocketEvent {
    /// Decode one event from its header and endpoint frames.
    pub fn decode(header: &[u8], endpoint: &[u8]) -> Result<Self> {
        let header: [u8; 6] = header.try_into().map_err(|_| {
            Error::Monitor(format!("event header is {} bytes, expected 6", header.len()))
        })?;
        let id = u16::from_le_bytes([header[0], header[1]]);
        let value = u32::from_le_bytes([header[2], header[3], header[4], header[5]]);
        let endpoint = String::from_utf8_lossy(endpoint).into_owned();

        Ok(match lookup(id) {
            Some(zmq::SocketEvent::CONNECTED) => Self::Connected(endpoint),
            Some(zmq::SocketEvent::CONNECT_DELAYED) => Self::ConnectDelayed(endpoint),
            Some(zmq::SocketEvent::CONNECT_RETRIED) => Self::ConnectRetried {
                endpoint,
                interval_ms: value,
            },
            Some(zmq::SocketEvent::LISTENING) => Self::Listening(endpoint),
            Some(zmq::SocketEvent::BIND_FAILED) => Self::BindFailed {
                endpoint,
                errno: value,
            },
            Some(zmq::SocketEvent::ACCEPTED) => Self::Accepted(endpoint),
            Some(zmq::SocketEvent::ACCEPT_FAILED) => Self::AcceptFailed {
                endpoint,
                errno: value,
            },
            Some(zmq::SocketEvent::CLOSED) => Self::Closed(endpoint),
            Some(zmq::SocketEvent::CLOSE_FAILED) => Self::CloseFailed {
                endpoint,
                errno: value,
            },
            Some(zmq::SocketEvent::DISCONNECTED) => Self::Disconnected(endpoint),
            Some(zmq::SocketEvent::MONITOR_STOPPED) => Self::MonitorStopped,
            _ => Self::Unknown {
                id,
                value,
                endpoint,
            },
        })
    }
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected(ep) => write!(f, "Connected to {ep}"),
            Self::ConnectDelayed(ep) => write!(f, "Connect to {ep} delayed"),
            Self::ConnectRetried {
                endpoint,
                interval_ms,
            } => write!(f, "Retrying connect to {endpoint} in {interval_ms}ms"),
            Self::Listening(ep) => write!(f, "Listening on {ep}"),
            Self::BindFailed { endpoint, errno } => {
                write!(f, "Bind failed for {endpoint}: errno {errno}")
            }
            Self::Accepted(ep) => write!(f, "Accepted connection on {ep}"),
            Self::AcceptFailed { endpoint, errno } => {
                write!(f, "Accept failed on {endpoint}: errno {errno}")
            }
            Self::Closed(ep) => write!(f, "Closed {ep}"),
            Self::CloseFailed { endpoint, errno } => {
                write!(f, "Close failed for {endpoint}: errno {errno}")
            }
            Self::Disconnected(ep) => write!(f, "Disconnected from {ep}"),
            Self::MonitorStopped => f.write_str("Monitor stopped"),
            Self::Unknown { id, endpoint, .. } => write!(f, "Event {id:#06x} on {endpoint}"),
        }
    }
}

/// Block until the next event arrives on a PAIR socket connected to a
/// monitor endpoint.
pub fn read_event(socket: &Socket, pool: &FramePool) -> Result<SocketEvent> {
    let msg = socket.recv_multipart(pool)?;
    match msg.parts().as_slice() {
        [header, endpoint] => SocketEvent::decode(header, endpoint),
        parts => Err(Error::Monitor(format!(
            "event has {} frames, expected 2",
            parts.len()
        ))),
    }
}
