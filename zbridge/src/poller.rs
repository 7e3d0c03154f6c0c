//! Readiness polling over several sockets.
//!
//! [`poll`] blocks until at least one item is ready or the timeout passes.
//! Interrupted system calls are retried with the same items and never reach
//! the caller.

use std::time::Duration;

use tracing::trace;

use crate::error::{Error, Result};
use crate::socket::{retry_interrupted, Socket};

pub use zmq::{PollEvents, POLLERR, POLLIN, POLLOUT};

/// One socket to poll, with the events of interest and the events observed
/// by the last [`poll`] call.
#[derive(Debug)]
pub struct PollItem<'a> {
    socket: &'a Socket,
    interest: PollEvents,
    observed: PollEvents,
}

impl<'a> PollItem<'a> {
    /// Poll `socket` for `interest`.
    pub fn new(socket: &'a Socket, interest: PollEvents) -> Self {
        Self {
            socket,
            interest,
            observed: PollEvents::empty(),
        }
    }

    /// Poll `socket` for readability.
    pub fn readable(socket: &'a Socket) -> Self {
        Self::new(socket, POLLIN)
    }

    /// The polled socket.
    pub fn socket(&self) -> &'a Socket {
        self.socket
    }

    /// Events of interest.
    pub fn interest(&self) -> PollEvents {
        self.interest
    }

    /// Events seen by the last poll.
    pub fn observed(&self) -> PollEvents {
        self.observed
    }

    /// A frame can be received without blocking.
    pub fn is_readable(&self) -> bool {
        self.observed.contains(POLLIN)
    }

    /// A frame can be sent without blocking.
    pub fn is_writable(&self) -> bool {
        self.observed.contains(POLLOUT)
    }

    /// The socket reported an error condition.
    pub fn is_error(&self) -> bool {
        self.observed.contains(POLLERR)
    }
}

/// Wait for readiness on `items`.
///
/// - `None` blocks until something is ready
/// - `Some(Duration::ZERO)` checks once and returns immediately
/// - `Some(duration)` waits at most `duration`, truncated to milliseconds
///
/// Returns the number of ready items. Every item's observed events are
/// overwritten, including those of items that saw nothing.
pub fn poll(items: &mut [PollItem<'_>], timeout: Option<Duration>) -> Result<usize> {
    poll_with(items, timeout, |raw, millis| zmq::poll(raw, millis))
}

fn timeout_millis(timeout: Option<Duration>) -> i64 {
    match timeout {
        None => -1,
        Some(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
    }
}

/// [`poll`] with the transport primitive supplied by the caller.
pub(crate) fn poll_with<'a, F>(
    items: &mut [PollItem<'a>],
    timeout: Option<Duration>,
    mut primitive: F,
) -> Result<usize>
where
    F: FnMut(&mut [zmq::PollItem<'a>], i64) -> zmq::Result<i32>,
{
    let millis = timeout_millis(timeout);

    let mut raw = Vec::with_capacity(items.len());
    for item in items.iter() {
        let socket: &'a Socket = item.socket;
        raw.push(socket.raw().as_poll_item(item.interest));
    }

    let ready =
        retry_interrupted(|| primitive(raw.as_mut_slice(), millis)).map_err(Error::Poll)?;

    for (item, polled) in items.iter_mut().zip(&raw) {
        item.observed = polled.get_revents();
    }
    trace!("[POLLER] {} of {} items ready", ready, items.len());
    Ok(usize::try_from(ready).unwrap_or(0))
}
