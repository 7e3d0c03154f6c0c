//! zbridge Core
//!
//! This crate contains the transport-agnostic building blocks of a bridge:
//! - Socket kinds and their default attach mode (`socket_type`)
//! - Endpoint parsing and relay address synthesis (`endpoint`)
//! - Bridge configuration (`options`)
//! - Bounded lock-free reuse cache (`pool`)
//! - Lifecycle state shared between bridge workers (`state`)

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
pub mod endpoint;
pub mod options;
pub mod pool;
pub mod socket_type;
pub mod state;

/// Everything a bridge implementation imports from this crate.
pub mod prelude {
    pub use crate::endpoint::{relay_address, Endpoint, EndpointError};
    pub use crate::options::BridgeOptions;
    pub use crate::pool::Pool;
    pub use crate::socket_type::{Attach, SocketKind};
    pub use crate::state::{BridgeState, StateCell};
}
