//! # zbridge
//!
//! Thread-safe, queue-shaped access to ZeroMQ sockets.
//!
//! A ZeroMQ socket may only be used by the thread that created it. zbridge
//! wraps each socket in a [`Bridge`]: a pinned owner thread operates the
//! socket, and any number of threads talk to it through bounded queues.
//!
//! ## Architecture
//!
//! - **`zbridge-core`**: socket kinds, endpoint parsing, options, the reuse
//!   pool and the lifecycle state (no transport dependency)
//! - **`zbridge`**: the libzmq-backed pieces (this crate)
//!   - [`Socket`]: the thread-affine handle (`!Send`)
//!   - [`Frame`], [`Multipart`], [`FramePool`]: zero-copy received messages
//!     with explicit, idempotent release
//!   - [`poller::poll`]: readiness polling with interrupted-call retry
//!   - [`Bridge`]: owner and forwarder threads joined by a private relay
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use zbridge::prelude::*;
//!
//! # fn main() -> zbridge::Result<()> {
//! let ctx = Context::new();
//! let sink = Bridge::new(&ctx, SocketKind::Pull, "tcp://127.0.0.1:5557", 64);
//! let source = Bridge::new(&ctx, SocketKind::Push, "tcp://127.0.0.1:5557", 64);
//!
//! // Any thread may enqueue.
//! let producer = source.sender();
//! std::thread::spawn(move || {
//!     let _ = producer.send(vec!["job".into(), "42".into()]);
//! });
//!
//! let msg = sink.recv_timeout(Duration::from_secs(1))?;
//! assert_eq!(msg.parts(), vec![&b"job"[..], b"42"]);
//!
//! source.close()?;
//! sink.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Shutdown ordering
//!
//! Close every bridge and socket before the last [`Context`] clone is
//! dropped; terminating a context blocks until all of its sockets are
//! closed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod context;
pub mod dev_tracing;
pub mod error;
pub mod frame;
pub mod monitor;
pub mod multipart;
pub mod poller;
pub mod pool;
mod relay;
pub mod socket;

pub use bridge::{Bridge, BridgeBuilder, Outbound};
pub use bytes::Bytes;
pub use context::Context;
pub use error::{Error, Result};
pub use frame::Frame;
pub use monitor::{MonitorEvents, SocketEvent};
pub use multipart::Multipart;
pub use pool::FramePool;
pub use socket::Socket;
pub use zbridge_core::endpoint::Endpoint;
pub use zbridge_core::options::BridgeOptions;
pub use zbridge_core::socket_type::{Attach, SocketKind};
pub use zbridge_core::state::BridgeState;

/// Common imports.
pub mod prelude {
    pub use crate::bridge::{Bridge, BridgeBuilder, Outbound};
    pub use crate::context::Context;
    pub use crate::error::{Error, Result};
    pub use crate::frame::Frame;
    pub use crate::multipart::Multipart;
    pub use crate::poller::{poll, PollItem};
    pub use crate::pool::FramePool;
    pub use crate::socket::Socket;
    pub use bytes::Bytes;
    pub use zbridge_core::options::BridgeOptions;
    pub use zbridge_core::socket_type::{Attach, SocketKind};
    pub use zbridge_core::state::BridgeState;
}
