//! Thread-affine transport socket.
//!
//! [`Socket`] wraps one transport handle. The handle is only valid on the
//! thread that created it, so the wrapper is `!Send` and `!Sync`: the
//! compiler rejects any attempt to move it to another thread. Bridges get
//! around this by creating their sockets inside their own worker threads.
//!
//! Receives are zero-copy: each frame keeps the transport's buffer alive
//! until it is released. Sends copy the caller's bytes.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use smallvec::SmallVec;
use tracing::trace;
use zbridge_core::options::BridgeOptions;
use zbridge_core::socket_type::{Attach, SocketKind};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::monitor::MonitorEvents;
use crate::multipart::Multipart;
use crate::pool::FramePool;

/// Run `op` again for as long as it reports an interrupted system call.
pub(crate) fn retry_interrupted<T>(mut op: impl FnMut() -> zmq::Result<T>) -> zmq::Result<T> {
    loop {
        match op() {
            Err(zmq::Error::EINTR) => trace!("[SOCKET] Interrupted call, retrying"),
            other => return other,
        }
    }
}

fn socket_type(kind: SocketKind) -> zmq::SocketType {
    match kind {
        SocketKind::Pair => zmq::PAIR,
        SocketKind::Pub => zmq::PUB,
        SocketKind::Sub => zmq::SUB,
        SocketKind::Req => zmq::REQ,
        SocketKind::Rep => zmq::REP,
        SocketKind::Dealer => zmq::DEALER,
        SocketKind::Router => zmq::ROUTER,
        SocketKind::Pull => zmq::PULL,
        SocketKind::Push => zmq::PUSH,
        SocketKind::XPub => zmq::XPUB,
        SocketKind::XSub => zmq::XSUB,
        SocketKind::Stream => zmq::STREAM,
    }
}

/// Transport handle bound to the thread that created it.
pub struct Socket {
    inner: zmq::Socket,
    kind: SocketKind,
    // Keeps the wrapper !Send + !Sync.
    _thread_bound: PhantomData<*const ()>,
}

impl Socket {
    pub(crate) fn new(ctx: &zmq::Context, kind: SocketKind) -> Result<Self> {
        let inner = ctx.socket(socket_type(kind)).map_err(Error::Socket)?;
        Ok(Self {
            inner,
            kind,
            _thread_bound: PhantomData,
        })
    }

    /// Socket kind this handle was created with.
    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// Listen on `endpoint`.
    pub fn bind(&self, endpoint: &str) -> Result<()> {
        self.inner
            .bind(endpoint)
            .map_err(|e| Error::connection(endpoint, e))
    }

    /// Stop listening on `endpoint`.
    pub fn unbind(&self, endpoint: &str) -> Result<()> {
        self.inner
            .unbind(endpoint)
            .map_err(|e| Error::connection(endpoint, e))
    }

    /// Dial `endpoint`.
    pub fn connect(&self, endpoint: &str) -> Result<()> {
        self.inner
            .connect(endpoint)
            .map_err(|e| Error::connection(endpoint, e))
    }

    /// Hang up on `endpoint`.
    pub fn disconnect(&self, endpoint: &str) -> Result<()> {
        self.inner
            .disconnect(endpoint)
            .map_err(|e| Error::connection(endpoint, e))
    }

    /// Bind or connect, depending on `attach`.
    pub fn attach(&self, attach: Attach, endpoint: &str) -> Result<()> {
        match attach {
            Attach::Bind => self.bind(endpoint),
            Attach::Connect => self.connect(endpoint),
        }
    }

    /// The last endpoint this socket bound to, with wildcards resolved.
    pub fn last_endpoint(&self) -> Result<String> {
        match self.inner.get_last_endpoint().map_err(Error::Socket)? {
            Ok(endpoint) => Ok(endpoint),
            Err(raw) => Ok(String::from_utf8_lossy(&raw).into_owned()),
        }
    }

    /// Set ZMQ_LINGER in milliseconds (`-1` waits forever).
    pub fn set_linger(&self, millis: i32) -> Result<()> {
        self.inner.set_linger(millis).map_err(Error::Socket)
    }

    /// Set ZMQ_SNDTIMEO; sends that cannot complete in time fail with `EAGAIN`.
    pub fn set_send_timeout(&self, timeout: Duration) -> Result<()> {
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        self.inner.set_sndtimeo(millis).map_err(Error::Socket)
    }

    /// Add a SUB prefix filter.
    pub fn subscribe(&self, prefix: &[u8]) -> Result<()> {
        self.inner.set_subscribe(prefix).map_err(Error::Socket)
    }

    /// Apply the socket-level parts of `options`.
    pub fn apply_options(&self, options: &BridgeOptions) -> Result<()> {
        self.set_linger(options.linger_millis())?;
        if let Some(hwm) = options.send_hwm {
            self.inner.set_sndhwm(hwm).map_err(Error::Socket)?;
        }
        if let Some(hwm) = options.recv_hwm {
            self.inner.set_rcvhwm(hwm).map_err(Error::Socket)?;
        }
        if let Some(identity) = &options.identity {
            self.inner.set_identity(identity).map_err(Error::Socket)?;
        }
        for prefix in options.subscriptions_for(self.kind) {
            self.subscribe(&prefix)?;
        }
        Ok(())
    }

    /// Block until one frame arrives.
    ///
    /// The frame's wrapper comes from `pool`. Interrupted calls are retried;
    /// any other failure hands the wrapper back before returning.
    pub fn recv_frame(&self, pool: &FramePool) -> Result<Frame> {
        receive_frame(pool, |msg| self.recv_raw(msg))
    }

    /// Receive frames until one arrives without the more-flag.
    ///
    /// Frames received before a failure are released before the error is
    /// returned.
    pub fn recv_multipart(&self, pool: &FramePool) -> Result<Multipart> {
        receive_multipart(pool, |msg| self.recv_raw(msg))
    }

    fn recv_raw(&self, msg: &mut zmq::Message) -> zmq::Result<bool> {
        self.inner.recv(msg, 0)?;
        Ok(msg.get_more())
    }

    /// Send one multipart message.
    ///
    /// Every part but the last carries the more-flag. The first failure
    /// aborts the rest of the message; parts already handed over are not
    /// resent.
    pub fn send_multipart<I, T>(&self, parts: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        send_parts(parts, |data, more| self.send_part(data, more))
    }

    /// Send a single frame, retrying interrupted calls.
    pub(crate) fn send_part(&self, data: &[u8], more: bool) -> zmq::Result<()> {
        let flags = if more { zmq::SNDMORE } else { 0 };
        retry_interrupted(|| self.inner.send(data, flags))
    }

    /// Send a single frame without blocking.
    ///
    /// Returns `Ok(false)` when the socket cannot take the frame right now
    /// (high water mark reached, or no peer to route to).
    pub(crate) fn try_send_part(&self, data: &[u8], more: bool) -> Result<bool> {
        let flags = if more {
            zmq::DONTWAIT | zmq::SNDMORE
        } else {
            zmq::DONTWAIT
        };
        match retry_interrupted(|| self.inner.send(data, flags)) {
            Ok(()) => Ok(true),
            Err(zmq::Error::EAGAIN) => Ok(false),
            Err(e) => Err(Error::Transfer(e)),
        }
    }

    /// Publish lifecycle events for this socket on the PAIR endpoint
    /// `endpoint`. See [`crate::monitor`].
    pub fn monitor(&self, endpoint: &str, events: MonitorEvents) -> Result<()> {
        self.inner
            .monitor(endpoint, i32::from(events.bits()))
            .map_err(|e| Error::connection(endpoint, e))
    }

    pub(crate) fn raw(&self) -> &zmq::Socket {
        &self.inner
    }
}

/// Receive one frame into a pooled wrapper.
///
/// `recv` fills the message and reports its more-flag. On failure the
/// wrapper goes back to `pool` before the error is returned.
pub(crate) fn receive_frame<F>(pool: &FramePool, mut recv: F) -> Result<Frame>
where
    F: FnMut(&mut zmq::Message) -> zmq::Result<bool>,
{
    let mut slot = pool.acquire();
    match retry_interrupted(|| recv(&mut *slot)) {
        Ok(more) => Ok(Frame::new(slot, more, pool.clone())),
        Err(e) => {
            pool.release(slot);
            Err(Error::Transfer(e))
        }
    }
}

/// Receive frames with `recv` until one arrives without the more-flag.
pub(crate) fn receive_multipart<F>(pool: &FramePool, mut recv: F) -> Result<Multipart>
where
    F: FnMut(&mut zmq::Message) -> zmq::Result<bool>,
{
    let mut frames = SmallVec::new();
    loop {
        match receive_frame(pool, &mut recv) {
            Ok(frame) => {
                let more = frame.has_more();
                frames.push(frame);
                if !more {
                    trace!("[SOCKET] Received {} frames", frames.len());
                    return Ok(Multipart::from_frames(frames));
                }
            }
            Err(e) => {
                trace!("[SOCKET] Receive failed after {} frames", frames.len());
                let mut partial = Multipart::from_frames(frames);
                let _ = partial.close();
                return Err(e);
            }
        }
    }
}

/// Hand `parts` to `send` one frame at a time, stopping at the first failure.
pub(crate) fn send_parts<I, T, F>(parts: I, mut send: F) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
    F: FnMut(&[u8], bool) -> zmq::Result<()>,
{
    let mut parts = parts.into_iter().peekable();
    if parts.peek().is_none() {
        return Err(Error::EmptyMessage);
    }
    let mut sent = 0usize;
    while let Some(part) = parts.next() {
        let more = parts.peek().is_some();
        send(part.as_ref(), more).map_err(Error::Transfer)?;
        sent += 1;
    }
    trace!("[SOCKET] Sent {} frames", sent);
    Ok(())
}

/// A received message on its way out through another socket.
///
/// Frames are offered without blocking. When the socket refuses one, the
/// position is kept and [`PendingSend::resume`] picks up from there.
pub(crate) struct PendingSend {
    msg: Multipart,
    next: usize,
}

impl PendingSend {
    pub(crate) fn new(msg: Multipart) -> Self {
        Self { msg, next: 0 }
    }

    /// Offer the remaining frames. Returns true once the whole message is out.
    pub(crate) fn resume(&mut self, socket: &Socket) -> Result<bool> {
        let frames = self.msg.frames();
        while self.next < frames.len() {
            let more = self.next + 1 < frames.len();
            if !socket.try_send_part(frames[self.next].data(), more)? {
                return Ok(false);
            }
            self.next += 1;
        }
        Ok(true)
    }

    /// Frames already handed to the socket.
    pub(crate) fn sent(&self) -> usize {
        self.next
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket").field("kind", &self.kind).finish()
    }
}
