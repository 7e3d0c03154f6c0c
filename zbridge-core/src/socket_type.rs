//! Socket kind enumeration for bridged endpoints.
//!
//! `SocketKind` names the messaging pattern a bridge speaks on its external
//! handle. It also decides whether the bridge binds or connects by default.

use std::fmt;

/// Messaging socket kinds understood by the bridge.
///
/// The discriminants follow the transport's `ZMQ_TYPE` numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketKind {
    /// PAIR socket for exclusive bidirectional communication
    Pair = 0,

    /// PUB socket for publishing messages to subscribers
    Pub = 1,

    /// SUB socket for subscribing to published messages
    Sub = 2,

    /// REQ socket for synchronous request-reply client
    Req = 3,

    /// REP socket for synchronous request-reply server
    Rep = 4,

    /// DEALER socket for asynchronous request-reply patterns
    Dealer = 5,

    /// ROUTER socket for routing messages by identity
    Router = 6,

    /// PULL socket for receiving messages from pushers
    Pull = 7,

    /// PUSH socket for sending messages to pullers
    Push = 8,

    /// XPUB socket for extended publisher with subscription awareness
    XPub = 9,

    /// XSUB socket for extended subscriber with dynamic subscriptions
    XSub = 10,

    /// STREAM socket for raw TCP peers
    Stream = 11,
}

/// How a bridge attaches its external handle to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attach {
    /// Listen on the endpoint.
    Bind,
    /// Dial the endpoint.
    Connect,
}

impl SocketKind {
    /// Every kind, in discriminant order.
    pub const ALL: [SocketKind; 12] = [
        Self::Pair,
        Self::Pub,
        Self::Sub,
        Self::Req,
        Self::Rep,
        Self::Dealer,
        Self::Router,
        Self::Pull,
        Self::Push,
        Self::XPub,
        Self::XSub,
        Self::Stream,
    ];

    /// Get the socket kind as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "PAIR",
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Dealer => "DEALER",
            Self::Router => "ROUTER",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
            Self::XPub => "XPUB",
            Self::XSub => "XSUB",
            Self::Stream => "STREAM",
        }
    }

    /// Default attach mode for this kind.
    ///
    /// Server-side kinds (REP, ROUTER, PULL, PUB, XPUB) and PAIR bind,
    /// everything else connects.
    pub fn default_attach(&self) -> Attach {
        match self {
            Self::Rep | Self::Router | Self::Pull | Self::Pub | Self::XPub | Self::Pair => {
                Attach::Bind
            }
            Self::Req | Self::Dealer | Self::Push | Self::Sub | Self::XSub | Self::Stream => {
                Attach::Connect
            }
        }
    }

    /// Whether this kind ever receives messages from its peer.
    pub fn can_receive(&self) -> bool {
        !matches!(self, Self::Pub | Self::Push)
    }

    /// Whether this kind ever sends messages to its peer.
    pub fn can_send(&self) -> bool {
        !matches!(self, Self::Sub | Self::Pull)
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Attach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => f.write_str("bind"),
            Self::Connect => f.write_str("connect"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_kind_display() {
        assert_eq!(SocketKind::Dealer.to_string(), "DEALER");
        assert_eq!(SocketKind::Router.to_string(), "ROUTER");
        assert_eq!(SocketKind::Pub.to_string(), "PUB");
    }

    #[test]
    fn test_default_attach() {
        assert_eq!(SocketKind::Rep.default_attach(), Attach::Bind);
        assert_eq!(SocketKind::Pull.default_attach(), Attach::Bind);
        assert_eq!(SocketKind::Pub.default_attach(), Attach::Bind);
        assert_eq!(SocketKind::Req.default_attach(), Attach::Connect);
        assert_eq!(SocketKind::Push.default_attach(), Attach::Connect);
        assert_eq!(SocketKind::Sub.default_attach(), Attach::Connect);
    }

    #[test]
    fn test_direction() {
        assert!(!SocketKind::Pub.can_receive());
        assert!(!SocketKind::Pull.can_send());
        assert!(SocketKind::Dealer.can_send() && SocketKind::Dealer.can_receive());
    }

    #[test]
    fn test_all_is_in_discriminant_order() {
        for (i, kind) in SocketKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }
}
