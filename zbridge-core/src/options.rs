//! Bridge configuration options
//!
//! Configuration applied when a bridge spawns: queue capacity, how the
//! external handle attaches, and the handful of transport socket options
//! (linger, high water marks, identity, subscriptions) a bridge needs.

use bytes::Bytes;
use std::time::Duration;

use crate::socket_type::{Attach, SocketKind};

/// Default capacity of the outbound and inbound queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Default time a relay send waits before re-checking the owner.
pub const DEFAULT_RELAY_SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// Bridge configuration options.
///
/// # Examples
///
/// ```
/// use zbridge_core::options::BridgeOptions;
/// use zbridge_core::socket_type::Attach;
/// use std::time::Duration;
///
/// let opts = BridgeOptions::default()
///     .with_capacity(64)
///     .with_attach(Attach::Connect)
///     .with_linger(Some(Duration::from_millis(250)));
/// assert_eq!(opts.capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Capacity of the outbound and inbound queues.
    ///
    /// A full inbound queue stalls the owner loop, which is the only
    /// backpressure a bridge applies.
    /// - Default: 16 messages
    pub capacity: usize,

    /// Bind or connect override.
    ///
    /// - `None` (default): use [`SocketKind::default_attach`]
    pub attach: Option<Attach>,

    /// Linger timeout (ZMQ_LINGER) for the external handle.
    ///
    /// Also bounds how long closing a bridge keeps offering a message the
    /// socket refuses.
    ///
    /// - `None`: wait forever for pending messages on close
    /// - `Some(Duration::ZERO)` (default): discard pending messages on close
    /// - `Some(duration)`: wait up to duration
    pub linger: Option<Duration>,

    /// High water mark for sending (ZMQ_SNDHWM).
    ///
    /// - `None` (default): transport default
    pub send_hwm: Option<i32>,

    /// High water mark for receiving (ZMQ_RCVHWM).
    ///
    /// - `None` (default): transport default
    pub recv_hwm: Option<i32>,

    /// Socket identity / routing ID (ZMQ_ROUTING_ID).
    pub identity: Option<Bytes>,

    /// Topic prefixes for SUB bridges (ZMQ_SUBSCRIBE).
    ///
    /// An empty list on a SUB bridge subscribes to everything.
    pub subscriptions: Vec<Bytes>,

    /// How long one relay send blocks before the forwarder checks whether
    /// the owner loop is still alive.
    /// - Default: 100ms
    pub relay_send_timeout: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            attach: None,
            linger: Some(Duration::ZERO),
            send_hwm: None,
            recv_hwm: None,
            identity: None,
            subscriptions: Vec::new(),
            relay_send_timeout: DEFAULT_RELAY_SEND_TIMEOUT,
        }
    }
}

impl BridgeOptions {
    /// Create new bridge options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set queue capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Force bind or connect regardless of socket kind.
    pub fn with_attach(mut self, attach: Attach) -> Self {
        self.attach = Some(attach);
        self
    }

    /// Set linger timeout.
    pub fn with_linger(mut self, linger: Option<Duration>) -> Self {
        self.linger = linger;
        self
    }

    /// Set send high water mark.
    pub fn with_send_hwm(mut self, hwm: i32) -> Self {
        self.send_hwm = Some(hwm);
        self
    }

    /// Set receive high water mark.
    pub fn with_recv_hwm(mut self, hwm: i32) -> Self {
        self.recv_hwm = Some(hwm);
        self
    }

    /// Set socket identity.
    pub fn with_identity(mut self, identity: impl Into<Bytes>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Add a subscription prefix (SUB bridges only).
    pub fn with_subscription(mut self, prefix: impl Into<Bytes>) -> Self {
        self.subscriptions.push(prefix.into());
        self
    }

    /// Set relay send timeout.
    pub fn with_relay_send_timeout(mut self, timeout: Duration) -> Self {
        self.relay_send_timeout = timeout;
        self
    }

    /// Resolve the attach mode for `kind`.
    pub fn attach_for(&self, kind: SocketKind) -> Attach {
        self.attach.unwrap_or_else(|| kind.default_attach())
    }

    /// Linger in the transport's millisecond convention (`-1` waits forever).
    pub fn linger_millis(&self) -> i32 {
        match self.linger {
            None => -1,
            Some(d) => i32::try_from(d.as_millis()).unwrap_or(i32::MAX),
        }
    }

    /// Subscriptions to apply for `kind`.
    ///
    /// Returns nothing for non-SUB kinds, and a single catch-all prefix for
    /// a SUB bridge with no explicit subscriptions.
    pub fn subscriptions_for(&self, kind: SocketKind) -> Vec<Bytes> {
        match kind {
            SocketKind::Sub if self.subscriptions.is_empty() => vec![Bytes::new()],
            SocketKind::Sub => self.subscriptions.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = BridgeOptions::default();
        assert_eq!(opts.capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(opts.attach, None);
        assert_eq!(opts.linger, Some(Duration::ZERO));
        assert_eq!(opts.linger_millis(), 0);
        assert!(opts.identity.is_none());
        assert_eq!(opts.relay_send_timeout, DEFAULT_RELAY_SEND_TIMEOUT);
    }

    #[test]
    fn test_attach_override() {
        let opts = BridgeOptions::new();
        assert_eq!(opts.attach_for(SocketKind::Pair), Attach::Bind);

        let opts = opts.with_attach(Attach::Connect);
        assert_eq!(opts.attach_for(SocketKind::Pair), Attach::Connect);
        assert_eq!(opts.attach_for(SocketKind::Rep), Attach::Connect);
    }

    #[test]
    fn test_linger_millis() {
        assert_eq!(BridgeOptions::new().with_linger(None).linger_millis(), -1);
        assert_eq!(
            BridgeOptions::new()
                .with_linger(Some(Duration::from_millis(1500)))
                .linger_millis(),
            1500
        );
        assert_eq!(
            BridgeOptions::new()
                .with_linger(Some(Duration::from_secs(u64::MAX / 2000)))
                .linger_millis(),
            i32::MAX
        );
    }

    #[test]
    fn test_subscriptions_for() {
        let opts = BridgeOptions::new();
        assert_eq!(opts.subscriptions_for(SocketKind::Sub), vec![Bytes::new()]);
        assert!(opts.subscriptions_for(SocketKind::Pull).is_empty());

        let opts = opts.with_subscription("weather.").with_subscription("news.");
        assert_eq!(
            opts.subscriptions_for(SocketKind::Sub),
            vec![Bytes::from_static(b"weather."), Bytes::from_static(b"news.")]
        );
        assert!(opts.subscriptions_for(SocketKind::XSub).is_empty());
    }
}
