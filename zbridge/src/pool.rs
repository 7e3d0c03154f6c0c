//! Frame wrapper pool.
//!
//! Receiving a frame needs a heap-allocated transport message to receive
//! into. `FramePool` recycles those wrappers: a receive pops one (or
//! allocates on an empty pool), and releasing a frame resets the wrapper in
//! place and offers it back. Pools are passed explicitly to the receive path;
//! [`FramePool::global`] is the shared default.

use once_cell::sync::Lazy;
use zbridge_core::pool::Pool;

/// Capacity of the process-wide pool.
pub const DEFAULT_FRAME_POOL_CAPACITY: usize = 100;

static GLOBAL: Lazy<FramePool> = Lazy::new(|| FramePool::new(DEFAULT_FRAME_POOL_CAPACITY));

/// Bounded cache of reusable frame wrappers.
///
/// Cloning is cheap and clones share the same slots.
#[derive(Debug, Clone)]
pub struct FramePool {
    slots: Pool<Box<zmq::Message>>,
}

impl FramePool {
    /// Create a pool keeping at most `capacity` idle wrappers.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Pool::new(capacity),
        }
    }

    /// The process-wide pool.
    ///
    /// Created on first use and never drained.
    pub fn global() -> &'static FramePool {
        &GLOBAL
    }

    /// Pop an idle wrapper or allocate one.
    pub(crate) fn acquire(&self) -> Box<zmq::Message> {
        self.slots.take_or_else(|| Box::new(zmq::Message::new()))
    }

    /// Reset `slot` and offer it back; a full pool drops it.
    pub(crate) fn release(&self, mut slot: Box<zmq::Message>) {
        // Closes the old message, which frees the transport's buffer.
        *slot = zmq::Message::new();
        self.slots.put(slot);
    }

    /// Idle wrappers currently held.
    pub fn idle(&self) -> usize {
        self.slots.len()
    }

    /// Maximum number of idle wrappers.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }
}

impl Default for FramePool {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_POOL_CAPACITY)
    }
}
