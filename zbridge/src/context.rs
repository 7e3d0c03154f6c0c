//! Shared transport context.

use std::fmt;

use zbridge_core::socket_type::SocketKind;

use crate::error::{Error, Result};
use crate::socket::Socket;

/// Process-level transport context.
///
/// A `Context` is cheap to clone and safe to share between threads; every
/// clone refers to the same underlying context. Sockets created from it are
/// not shareable, see [`Socket`].
///
/// The underlying context is terminated when the last clone is dropped. That
/// termination blocks until every socket created from it is closed, so all
/// bridges and sockets must be closed before the last clone goes away.
#[derive(Clone)]
pub struct Context {
    inner: zmq::Context,
}

impl Context {
    /// Create a context with the transport's default I/O thread count.
    pub fn new() -> Self {
        Self {
            inner: zmq::Context::new(),
        }
    }

    /// Create a context with `threads` transport I/O threads.
    pub fn with_io_threads(threads: i32) -> Result<Self> {
        let ctx = Self::new();
        ctx.inner.set_io_threads(threads).map_err(Error::Socket)?;
        Ok(ctx)
    }

    /// Number of transport I/O threads.
    pub fn io_threads(&self) -> Result<i32> {
        self.inner.get_io_threads().map_err(Error::Socket)
    }

    /// Create a socket of `kind`, owned by the calling thread.
    pub fn socket(&self, kind: SocketKind) -> Result<Socket> {
        Socket::new(&self.inner, kind)
    }

    /// Release this handle on the context.
    ///
    /// If this is the last clone, this blocks until every socket created from
    /// the context has been closed.
    pub fn terminate(self) {
        drop(self);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("io_threads", &self.inner.get_io_threads().ok())
            .finish()
    }
}
