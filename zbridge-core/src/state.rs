//! Bridge lifecycle state.
//!
//! A bridge moves strictly forward through
//! `Initializing → Running → Draining → Closed`. The state is written by the
//! worker threads and read by anyone holding the bridge, so it lives in an
//! atomic that only ever advances.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BridgeState {
    /// Workers are being spawned and handles created.
    Initializing = 0,
    /// Both loops are running.
    Running = 1,
    /// Shutdown has started or a loop has failed.
    Draining = 2,
    /// Every handle owned by the bridge is closed.
    Closed = 3,
}

impl BridgeState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Initializing,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Closed,
        }
    }

    /// Get the state as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic atomic holder for a [`BridgeState`].
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    /// Create a cell in `Initializing`.
    pub const fn new() -> Self {
        Self(AtomicU8::new(BridgeState::Initializing as u8))
    }

    /// Current state.
    #[inline]
    pub fn get(&self) -> BridgeState {
        BridgeState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move forward to `next`.
    ///
    /// Never moves backwards: advancing a `Draining` cell to `Running` is a
    /// no-op. Returns the state held before the call.
    #[inline]
    pub fn advance(&self, next: BridgeState) -> BridgeState {
        BridgeState::from_u8(self.0.fetch_max(next as u8, Ordering::AcqRel))
    }

    /// Returns true once the bridge is `Draining` or `Closed`.
    #[inline]
    pub fn is_shutting_down(&self) -> bool {
        self.get() >= BridgeState::Draining
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
