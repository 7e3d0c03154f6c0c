//! The channel bridge.
//!
//! A [`Bridge`] turns one thread-affine socket into three thread-safe
//! queues:
//!
//! - **outbound**: any thread enqueues messages to send
//! - **inbound**: any thread takes messages received from the peer
//! - **errors**: failures of the bridge's workers, reported once each
//!
//! Two dedicated OS threads do the work. The *owner* thread creates the
//! external socket and is the only thread that ever touches it. It polls the
//! external socket and the owner end of a private in-process relay. The
//! *forwarder* thread moves messages from the outbound queue onto the relay,
//! so producers never need the socket itself.
//!
//! ```text
//!  producers ──► outbound ──► forwarder ──► relay ──┐
//!                                                    ▼
//!                                     owner ◄──► external socket ◄──► peer
//!                                       │
//!  consumers ◄── inbound ◄──────────────┘
//! ```
//!
//! # Lifecycle
//!
//! `Initializing → Running → Draining → Closed`. Construction never fails
//! synchronously: setup errors arrive on [`Bridge::errors`] and the bridge
//! goes straight to `Draining`/`Closed`. A full inbound queue blocks the
//! owner thread, which stalls both directions until a consumer catches up.
//! Outbound messages are handed to the socket without blocking; while the
//! socket refuses one (high water mark, no peer) the owner stops taking new
//! outbound messages off the relay.
//!
//! # Shutdown
//!
//! [`Bridge::close`] (or drop) closes the outbound queue, lets the forwarder
//! relay what is already queued, then tells the owner to stop, closes the
//! inbound queue and joins both threads. Every socket is closed before
//! `close` returns, so the [`Context`] can be terminated afterwards.
//!
//! Closing never waits on a consumer: an owner blocked on a full inbound
//! queue drops the message it holds, even if clones of [`Bridge::inbound`]
//! are still alive. A message the socket keeps refusing is dropped once the
//! configured linger has passed (`None` keeps trying until a peer takes it).
//!
//! If either worker stops on its own (transfer error, poll error, inbound
//! queue closed) the owner clears a shared liveness flag and signals the
//! forwarder, which then discards queued messages instead of relaying them.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::{Duration, Instant};
//! use zbridge::prelude::*;
//!
//! # fn main() -> zbridge::Result<()> {
//! let ctx = Context::new();
//! let server = Bridge::new(&ctx, SocketKind::Rep, "tcp://127.0.0.1:5555", 16);
//! let client = Bridge::new(&ctx, SocketKind::Req, "tcp://127.0.0.1:5555", 16);
//!
//! client.send(["hello"])?;
//! let request = server.recv_timeout(Duration::from_secs(1))?;
//! server.send(request.to_vec())?;
//! let reply = client.recv()?;
//! assert_eq!(reply.parts(), vec![&b"hello"[..]]);
//!
//! client.close()?;
//! server.close()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use flume::{Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use tracing::{debug, error, trace, warn};
use zbridge_core::endpoint::{relay_address, Endpoint};
use zbridge_core::options::BridgeOptions;
use zbridge_core::socket_type::SocketKind;
use zbridge_core::state::{BridgeState, StateCell};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::multipart::Multipart;
use crate::poller::{poll, PollEvents, PollItem, POLLIN, POLLOUT};
use crate::pool::FramePool;
use crate::relay::{RelayClient, RelayOwner, Relayed};
use crate::socket::{PendingSend, Socket};

static NEXT_BRIDGE_ID: AtomicU64 = AtomicU64::new(1);

/// An outbound message: its frames, in order.
pub type Outbound = Vec<Bytes>;

/// State visible to the bridge handle and both workers.
struct Shared {
    state: StateCell,
    owner_running: AtomicBool,
    worker_panicked: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: StateCell::new(),
            owner_running: AtomicBool::new(true),
            worker_panicked: AtomicBool::new(false),
        }
    }

    #[inline]
    fn owner_running(&self) -> bool {
        self.owner_running.load(Ordering::Acquire)
    }
}

/// Builder for a [`Bridge`].
///
/// Obtained from [`Bridge::builder`].
pub struct BridgeBuilder<'a> {
    ctx: &'a Context,
    kind: SocketKind,
    endpoint: String,
    options: BridgeOptions,
    pool: FramePool,
}

impl<'a> BridgeBuilder<'a> {
    /// Capacity of the outbound and inbound queues.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.options.capacity = capacity;
        self
    }

    /// Replace every option, including the capacity.
    pub fn options(mut self, options: BridgeOptions) -> Self {
        self.options = options;
        self
    }

    /// Receive into wrappers from `pool` instead of [`FramePool::global`].
    pub fn frame_pool(mut self, pool: FramePool) -> Self {
        self.pool = pool;
        self
    }

    /// Start the bridge.
    ///
    /// Never fails here; setup errors are delivered on [`Bridge::errors`].
    pub fn spawn(self) -> Bridge {
        let id = NEXT_BRIDGE_ID.fetch_add(1, Ordering::Relaxed);
        let capacity = self.options.capacity;

        let (outbound_tx, outbound_rx) = flume::bounded(capacity);
        let (inbound_tx, inbound_rx) = flume::bounded(capacity);
        let (errors_tx, errors_rx) = flume::unbounded();
        let (close_tx, close_rx) = flume::bounded(1);
        let (stop_tx, stop_rx) = flume::bounded(1);
        let shared = Arc::new(Shared::new());

        let mut bridge = Bridge {
            id,
            kind: self.kind,
            endpoint: self.endpoint.clone(),
            relay_addr: None,
            outbound: outbound_tx,
            close_tx: close_tx.clone(),
            stop: stop_tx,
            inbound: inbound_rx,
            errors: errors_rx,
            shared: Arc::clone(&shared),
            owner: None,
        };

        let endpoint = match Endpoint::parse(&self.endpoint) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                bridge.fail(&errors_tx, e.into());
                return bridge;
            }
        };
        let relay_addr = relay_address(self.kind, &endpoint, id);
        bridge.relay_addr = Some(relay_addr.clone());

        let forwarder = Forwarder {
            id,
            ctx: self.ctx.clone(),
            relay_addr: relay_addr.clone(),
            send_timeout: self.options.relay_send_timeout,
            outbound: outbound_rx,
            close: close_rx,
            errors: errors_tx.clone(),
            shared: Arc::clone(&shared),
        };
        let owner = Owner {
            id,
            ctx: self.ctx.clone(),
            kind: self.kind,
            endpoint: self.endpoint,
            relay_addr,
            options: self.options,
            pool: self.pool,
            forwarder: Some(forwarder),
            close: close_tx,
            stop: stop_rx,
            inbound: inbound_tx,
            errors: errors_tx.clone(),
            shared,
        };

        match thread::Builder::new()
            .name(format!("zbridge-owner-{id}"))
            .spawn(move || owner.run())
        {
            Ok(handle) => bridge.owner = Some(handle),
            Err(e) => bridge.fail(&errors_tx, Error::Spawn(e)),
        }
        bridge
    }
}

/// Thread-safe, queue-shaped front for one socket.
///
/// See the [module documentation](self) for the threading model.
pub struct Bridge {
    id: u64,
    kind: SocketKind,
    endpoint: String,
    relay_addr: Option<String>,
    outbound: Sender<Outbound>,
    close_tx: Sender<()>,
    // Never sent on; dropping it tells the owner to stop.
    stop: Sender<()>,
    inbound: Receiver<Multipart>,
    errors: Receiver<Error>,
    shared: Arc<Shared>,
    owner: Option<JoinHandle<()>>,
}

impl Bridge {
    /// Start a bridge with default options and the given queue capacity.
    pub fn new(ctx: &Context, kind: SocketKind, endpoint: impl Into<String>, capacity: usize) -> Self {
        Self::builder(ctx, kind, endpoint).capacity(capacity).spawn()
    }

    /// Configure a bridge before starting it.
    pub fn builder(ctx: &Context, kind: SocketKind, endpoint: impl Into<String>) -> BridgeBuilder<'_> {
        BridgeBuilder {
            ctx,
            kind,
            endpoint: endpoint.into(),
            options: BridgeOptions::default(),
            pool: FramePool::global().clone(),
        }
    }

    /// Process-unique bridge number.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Socket kind of the external handle.
    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// Endpoint as given at construction.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Private relay address, `None` if the endpoint did not parse.
    pub fn relay_address(&self) -> Option<&str> {
        self.relay_addr.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.shared.state.get()
    }

    /// Enqueue one message, blocking while the outbound queue is full.
    pub fn send<I, T>(&self, parts: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        let msg = self.outbound_message(parts)?;
        self.outbound.send(msg).map_err(|_| Error::Closed)
    }

    /// Enqueue one message without blocking.
    pub fn try_send<I, T>(&self, parts: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        let msg = self.outbound_message(parts)?;
        self.outbound.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => Error::QueueFull,
            TrySendError::Disconnected(_) => Error::Closed,
        })
    }

    fn outbound_message<I, T>(&self, parts: I) -> Result<Outbound>
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        if !self.kind.can_send() {
            return Err(Error::SendNotSupported(self.kind));
        }
        if self.shared.state.is_shutting_down() {
            return Err(Error::Closed);
        }
        let msg: Outbound = parts.into_iter().map(Into::into).collect();
        if msg.is_empty() {
            return Err(Error::EmptyMessage);
        }
        Ok(msg)
    }

    /// A producer handle on the outbound queue.
    ///
    /// Messages sent through it skip the checks done by [`Bridge::send`];
    /// an empty message is reported on the error queue and dropped.
    pub fn sender(&self) -> Sender<Outbound> {
        self.outbound.clone()
    }

    /// Block until a message arrives.
    pub fn recv(&self) -> Result<Multipart> {
        self.inbound.recv().map_err(|_| Error::Closed)
    }

    /// Wait at most `timeout` for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Multipart> {
        self.inbound.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => Error::Timeout,
            RecvTimeoutError::Disconnected => Error::Closed,
        })
    }

    /// Take a message if one is waiting.
    pub fn try_recv(&self) -> Result<Option<Multipart>> {
        match self.inbound.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::Closed),
        }
    }

    /// The inbound queue.
    ///
    /// Clones may outlive the bridge; they see a disconnected queue once the
    /// bridge has closed and the remaining messages are taken.
    pub fn inbound(&self) -> &Receiver<Multipart> {
        &self.inbound
    }

    /// The error queue.
    pub fn errors(&self) -> &Receiver<Error> {
        &self.errors
    }

    /// Shut the bridge down and wait for its workers.
    ///
    /// Messages already in the outbound queue are relayed first; messages
    /// still in the inbound queue are dropped. Fails only if a worker
    /// panicked.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn fail(&mut self, errors: &Sender<Error>, err: Error) {
        error!(
            bridge = self.id,
            kind = %self.kind,
            endpoint = %self.endpoint,
            error = %err,
            "[BRIDGE] Setup failed"
        );
        let _ = errors.send(err);
        self.shared.owner_running.store(false, Ordering::Release);
        self.shared.state.advance(BridgeState::Closed);
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(owner) = self.owner.take() else {
            return Ok(());
        };
        debug!(bridge = self.id, "[BRIDGE] Closing");
        self.shared.state.advance(BridgeState::Draining);

        // Swap in disconnected ends: the real ones must go away now even
        // though the handle lives on until the caller drops it.
        drop(mem::replace(&mut self.outbound, flume::bounded(0).0));
        let _ = self.close_tx.try_send(());
        drop(mem::replace(&mut self.stop, flume::bounded(0).0));
        drop(mem::replace(&mut self.inbound, flume::bounded(0).1));

        let joined = owner.join();
        self.shared.state.advance(BridgeState::Closed);
        debug!(bridge = self.id, "[BRIDGE] Closed");

        if joined.is_err() || self.shared.worker_panicked.load(Ordering::Acquire) {
            return Err(Error::WorkerPanicked);
        }
        Ok(())
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(bridge = self.id, error = %e, "[BRIDGE] Shutdown on drop failed");
        }
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

/// The pinned thread that owns the external socket.
struct Owner {
    id: u64,
    ctx: Context,
    kind: SocketKind,
    endpoint: String,
    relay_addr: String,
    options: BridgeOptions,
    pool: FramePool,
    forwarder: Option<Forwarder>,
    close: Sender<()>,
    stop: Receiver<()>,
    inbound: Sender<Multipart>,
    errors: Sender<Error>,
    shared: Arc<Shared>,
}

impl Owner {
    fn run(mut self) {
        debug!(
            bridge = self.id,
            kind = %self.kind,
            endpoint = %self.endpoint,
            "[OWNER] Starting"
        );

        match self.open() {
            Ok((external, relay, forwarder)) => {
                self.shared.state.advance(BridgeState::Running);
                debug!(bridge = self.id, "[OWNER] Running");

                if let Err(e) = self.pump(&external, &relay) {
                    self.report(e);
                }
                self.wind_down();
                drop(external);
                drop(relay);

                if forwarder.join().is_err() {
                    self.forwarder_panicked();
                }
            }
            Err(e) => {
                self.report(e);
                self.wind_down();
            }
        }

        self.shared.state.advance(BridgeState::Closed);
        debug!(bridge = self.id, "[OWNER] Stopped");
    }

    /// Create the external socket and the relay, then start the forwarder.
    fn open(&mut self) -> Result<(Socket, RelayOwner, JoinHandle<()>)> {
        let external = self.ctx.socket(self.kind)?;
        external.apply_options(&self.options)?;
        let attach = self.options.attach_for(self.kind);
        external.attach(attach, &self.endpoint)?;
        debug!(
            bridge = self.id,
            ?attach,
            endpoint = %self.endpoint,
            "[OWNER] External socket attached"
        );

        let relay = RelayOwner::bind(&self.ctx, &self.relay_addr)?;
        let forwarder = self.spawn_forwarder()?;
        Ok((external, relay, forwarder))
    }

    /// Start the forwarder and wait until its relay end is connected.
    fn spawn_forwarder(&mut self) -> Result<JoinHandle<()>> {
        let Some(forwarder) = self.forwarder.take() else {
            return Err(Error::Relay("forwarder already started"));
        };
        let (ready_tx, ready_rx) = flume::bounded(1);
        let handle = thread::Builder::new()
            .name(format!("zbridge-fwd-{}", self.id))
            .spawn(move || forwarder.run(ready_tx))
            .map_err(Error::Spawn)?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(RecvError::Disconnected) => {
                let _ = handle.join();
                self.shared.worker_panicked.store(true, Ordering::Release);
                Err(Error::WorkerPanicked)
            }
        }
    }

    /// Poll both sockets until shutdown or the first failure.
    fn pump(&self, external: &Socket, relay: &RelayOwner) -> Result<()> {
        let mut pending: Option<PendingSend> = None;
        let mut give_up_at: Option<Instant> = None;
        let mut receiving = self.kind.can_receive();

        loop {
            let mut interest = PollEvents::empty();
            if receiving {
                interest |= POLLIN;
            }
            if pending.is_some() {
                interest |= POLLOUT;
            }
            // The relay is left unread while a message is stuck, so the
            // forwarder and the outbound queue push back on producers.
            let relay_interest = if pending.is_none() {
                POLLIN
            } else {
                PollEvents::empty()
            };
            let mut items = [
                PollItem::new(external, interest),
                PollItem::new(relay.socket(), relay_interest),
            ];
            // A stuck message needs the stop signal checked now and then.
            let timeout = pending.as_ref().map(|_| self.options.relay_send_timeout);
            poll(&mut items, timeout)?;

            if items[0].is_readable() {
                let msg = external.recv_multipart(&self.pool)?;
                trace!(bridge = self.id, "[OWNER] Inbound message of {} frames", msg.len());
                if !self.deliver(msg) {
                    debug!(bridge = self.id, "[OWNER] Inbound closed, no longer receiving");
                    receiving = false;
                }
            }

            if let Some(send) = pending.as_mut() {
                if send.resume(external)? {
                    trace!(bridge = self.id, "[OWNER] Blocked message sent");
                    pending = None;
                    give_up_at = None;
                } else if self.stop_requested() && self.linger_expired(&mut give_up_at) {
                    debug!(
                        bridge = self.id,
                        sent = send.sent(),
                        "[OWNER] Peer not taking messages, dropping pending message"
                    );
                    return Ok(());
                }
            }

            if items[1].is_readable() {
                match relay.recv(&self.pool)? {
                    Relayed::Data(msg) => {
                        trace!(bridge = self.id, "[OWNER] Outbound message of {} frames", msg.len());
                        let mut send = PendingSend::new(msg);
                        if !send.resume(external)? {
                            trace!(bridge = self.id, "[OWNER] Socket full, holding message");
                            pending = Some(send);
                        }
                    }
                    Relayed::Shutdown => {
                        debug!(bridge = self.id, "[OWNER] Shutdown requested");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Push `msg` onto the inbound queue, giving up if the bridge is closed
    /// while the queue is full. Returns false once nothing more should be
    /// delivered.
    fn deliver(&self, msg: Multipart) -> bool {
        if self.stop_requested() {
            return false;
        }
        flume::Selector::new()
            .send(&self.inbound, msg, |sent| sent.is_ok())
            .recv(&self.stop, |_| false)
            .wait()
    }

    fn stop_requested(&self) -> bool {
        self.stop.is_disconnected()
    }

    /// Start the linger clock on first call; true once it has run out.
    fn linger_expired(&self, give_up_at: &mut Option<Instant>) -> bool {
        let Some(linger) = self.options.linger else {
            return false;
        };
        let deadline = *give_up_at.get_or_insert_with(|| Instant::now() + linger);
        Instant::now() >= deadline
    }

    /// Mark the owner as gone and make sure the forwarder notices.
    fn wind_down(&self) {
        self.shared.owner_running.store(false, Ordering::Release);
        let _ = self.close.try_send(());
        self.shared.state.advance(BridgeState::Draining);
    }

    fn forwarder_panicked(&self) {
        self.shared.worker_panicked.store(true, Ordering::Release);
        self.report(Error::WorkerPanicked);
    }

    fn report(&self, err: Error) {
        error!(
            bridge = self.id,
            kind = %self.kind,
            endpoint = %self.endpoint,
            error = %err,
            "[OWNER] Bridge failed"
        );
        let _ = self.errors.send(err);
    }
}

enum Event {
    Outbound(std::result::Result<Outbound, RecvError>),
    Close,
}

/// The thread that moves the outbound queue onto the relay.
struct Forwarder {
    id: u64,
    ctx: Context,
    relay_addr: String,
    send_timeout: Duration,
    outbound: Receiver<Outbound>,
    close: Receiver<()>,
    errors: Sender<Error>,
    shared: Arc<Shared>,
}

impl Forwarder {
    fn run(self, ready: Sender<Result<()>>) {
        let client = match RelayClient::connect(&self.ctx, &self.relay_addr, self.send_timeout) {
            Ok(client) => client,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        if ready.send(Ok(())).is_err() {
            return;
        }
        trace!(bridge = self.id, "[FORWARDER] Running");

        loop {
            let event = flume::Selector::new()
                .recv(&self.outbound, Event::Outbound)
                .recv(&self.close, |_| Event::Close)
                .wait();

            match event {
                Event::Outbound(Ok(parts)) => {
                    if !self.forward(&client, parts) {
                        return;
                    }
                }
                Event::Outbound(Err(RecvError::Disconnected)) | Event::Close => break,
            }
        }

        if !self.shared.owner_running() {
            debug!(
                bridge = self.id,
                "[FORWARDER] Owner gone, discarding {} queued messages",
                self.outbound.len()
            );
            return;
        }

        // Relay what was queued before close, then release the owner.
        for _ in 0..self.outbound.len() {
            match self.outbound.try_recv() {
                Ok(parts) => {
                    if !self.forward(&client, parts) {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        match client.send_shutdown(|| self.shared.owner_running()) {
            Ok(()) => trace!(bridge = self.id, "[FORWARDER] Shutdown relayed"),
            Err(_) if !self.shared.owner_running() => {
                debug!(bridge = self.id, "[FORWARDER] Owner stopped before shutdown");
            }
            Err(e) => self.report(e),
        }
    }

    /// Relay one message. Returns false when the forwarder must stop.
    fn forward(&self, client: &RelayClient, parts: Outbound) -> bool {
        if parts.is_empty() {
            warn!(bridge = self.id, "[FORWARDER] Dropping empty message");
            let _ = self.errors.send(Error::EmptyMessage);
            return true;
        }
        match client.send_data(&parts, || self.shared.owner_running()) {
            Ok(()) => true,
            Err(_) if !self.shared.owner_running() => {
                debug!(bridge = self.id, "[FORWARDER] Owner gone, dropping message");
                false
            }
            Err(e) => {
                self.report(e);
                false
            }
        }
    }

    fn report(&self, err: Error) {
        error!(bridge = self.id, error = %err, "[FORWARDER] Relay failed");
        let _ = self.errors.send(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_ids_are_unique() {
        let ctx = Context::new();
        let a = Bridge::new(&ctx, SocketKind::Pull, "inproc://bridge-ids", 4);
        let b = Bridge::new(&ctx, SocketKind::Push, "inproc://bridge-ids", 4);
        assert_ne!(a.id(), b.id());
        assert_ne!(a.relay_address(), b.relay_address());
        b.close().unwrap();
        a.close().unwrap();
    }

    #[test]
    fn test_invalid_endpoint_reported() {
        let ctx = Context::new();
        let bridge = Bridge::new(&ctx, SocketKind::Push, "bogus://x", 4);
        let err = bridge.errors().recv_timeout(WAIT).unwrap();
        assert!(matches!(err, Error::InvalidEndpoint(_)));
        assert_eq!(bridge.state(), BridgeState::Closed);
        assert!(bridge.relay_address().is_none());
        assert!(matches!(bridge.send(["x"]), Err(Error::Closed)));
    }

    #[test]
    fn test_send_rejected_for_receive_only_kind() {
        let ctx = Context::new();
        let bridge = Bridge::new(&ctx, SocketKind::Pull, "inproc://bridge-pull-only", 4);
        assert!(matches!(
            bridge.send(["x"]),
            Err(Error::SendNotSupported(SocketKind::Pull))
        ));
        bridge.close().unwrap();
    }

    #[test]
    fn test_empty_send_rejected() {
        let ctx = Context::new();
        let bridge = Bridge::new(&ctx, SocketKind::Push, "inproc://bridge-empty", 4);
        let parts: Vec<Bytes> = Vec::new();
        assert!(matches!(bridge.send(parts), Err(Error::EmptyMessage)));
        bridge.close().unwrap();
    }

    #[test]
    fn test_empty_message_via_sender_is_reported() {
        let ctx = Context::new();
        let bridge = Bridge::new(&ctx, SocketKind::Push, "inproc://bridge-empty-raw", 4);
        bridge.sender().send(Vec::new()).unwrap();
        let err = bridge.errors().recv_timeout(WAIT).unwrap();
        assert!(matches!(err, Error::EmptyMessage));
        bridge.close().unwrap();
    }

    #[test]
    fn test_close_idle_bridge_reaches_closed() {
        let ctx = Context::new();
        let bridge = Bridge::new(&ctx, SocketKind::Pair, "inproc://bridge-idle", 4);
        let shared = Arc::clone(&bridge.shared);
        bridge.close().unwrap();
        assert_eq!(shared.state.get(), BridgeState::Closed);
        assert!(!shared.owner_running());
    }
}
