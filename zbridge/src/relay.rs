//! Private in-process relay between a bridge's forwarder and owner threads.
//!
//! The owner binds a PAIR socket on the bridge's relay address and the
//! forwarder connects to it. Every relay message starts with a one-byte tag
//! frame: [`TAG_DATA`] is followed by the frames to put on the wire as-is,
//! [`TAG_SHUTDOWN`] stands alone and tells the owner to leave its loop.

use std::time::Duration;

use bytes::Bytes;
use tracing::trace;
use zbridge_core::socket_type::SocketKind;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::multipart::Multipart;
use crate::pool::FramePool;
use crate::socket::Socket;

/// Tag of a relay message carrying outbound frames.
pub(crate) const TAG_DATA: u8 = 0x01;

/// Tag of the relay message that ends the owner loop.
pub(crate) const TAG_SHUTDOWN: u8 = 0x00;

/// A decoded relay message.
#[derive(Debug)]
pub(crate) enum Relayed {
    Data(Multipart),
    Shutdown,
}

/// Owner-side relay end.
pub(crate) struct RelayOwner {
    socket: Socket,
}

impl RelayOwner {
    pub(crate) fn bind(ctx: &Context, address: &str) -> Result<Self> {
        let socket = ctx.socket(SocketKind::Pair)?;
        socket.set_linger(0)?;
        socket.bind(address)?;
        trace!("[RELAY] Owner end bound to {}", address);
        Ok(Self { socket })
    }

    pub(crate) fn socket(&self) -> &Socket {
        &self.socket
    }

    /// Receive and decode one relay message.
    pub(crate) fn recv(&self, pool: &FramePool) -> Result<Relayed> {
        let mut msg = self.socket.recv_multipart(pool)?;
        let tag = msg.pop_front().ok_or(Error::Relay("empty relay message"))?;
        match tag.data() {
            [TAG_DATA] => Ok(Relayed::Data(msg)),
            [TAG_SHUTDOWN] if msg.is_empty() => Ok(Relayed::Shutdown),
            _ => Err(Error::Relay("unknown relay tag")),
        }
    }
}

/// Forwarder-side relay end.
pub(crate) struct RelayClient {
    socket: Socket,
}

impl RelayClient {
    /// Connect to the owner end. Sends give up with `EAGAIN` after
    /// `send_timeout`, so the caller can decide whether to retry.
    pub(crate) fn connect(ctx: &Context, address: &str, send_timeout: Duration) -> Result<Self> {
        let socket = ctx.socket(SocketKind::Pair)?;
        socket.set_linger(0)?;
        socket.set_send_timeout(send_timeout)?;
        socket.connect(address)?;
        trace!("[RELAY] Client end connected to {}", address);
        Ok(Self { socket })
    }

    /// Relay `parts` to the owner.
    ///
    /// A send that times out is retried for as long as `keep_trying`
    /// returns true; after that the `EAGAIN` is returned.
    pub(crate) fn send_data(&self, parts: &[Bytes], keep_trying: impl Fn() -> bool) -> Result<()> {
        self.send_frame(&[TAG_DATA], !parts.is_empty(), &keep_trying)?;
        let last = parts.len().saturating_sub(1);
        for (i, part) in parts.iter().enumerate() {
            self.send_frame(part, i != last, &keep_trying)?;
        }
        Ok(())
    }

    /// Tell the owner to leave its loop.
    pub(crate) fn send_shutdown(&self, keep_trying: impl Fn() -> bool) -> Result<()> {
        self.send_frame(&[TAG_SHUTDOWN], false, &keep_trying)
    }

    fn send_frame(&self, data: &[u8], more: bool, keep_trying: &impl Fn() -> bool) -> Result<()> {
        loop {
            match self.socket.send_part(data, more) {
                Ok(()) => return Ok(()),
                Err(zmq::Error::EAGAIN) if keep_trying() => {
                    trace!("[RELAY] Owner end busy, retrying");
                }
                Err(e) => return Err(Error::Transfer(e)),
            }
        }
    }
}
