//! Bounded reuse cache.
//!
//! `Pool<T>` keeps up to `capacity` idle values around so hot paths can
//! recycle them instead of allocating. The backing store is a bounded
//! MPMC channel, so every handle can be cloned and shared across threads
//! without a lock. Neither `take` nor `put` ever blocks: an empty pool
//! yields nothing and a full pool refuses the value.

use flume::{Receiver, Sender, TryRecvError};
use std::fmt;

/// Shared, bounded pool of reusable values.
pub struct Pool<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
}

impl<T> Pool<T> {
    /// Create an empty pool holding at most `capacity` idle values.
    ///
    /// A zero-capacity pool never retains anything.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// Pop an idle value, if any.
    #[inline]
    pub fn take(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Pop an idle value or build a fresh one.
    #[inline]
    pub fn take_or_else(&self, make: impl FnOnce() -> T) -> T {
        self.take().unwrap_or_else(make)
    }

    /// Offer a value back to the pool.
    ///
    /// Returns `false` (and drops the value) when the pool is full.
    #[inline]
    pub fn put(&self, value: T) -> bool {
        self.tx.try_send(value).is_ok()
    }

    /// Number of idle values currently held.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns true if no idle value is held.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Maximum number of idle values.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
