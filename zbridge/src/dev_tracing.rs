//! Development helper: initialize a tracing subscriber when `RUST_LOG` is set.
//!
//! Tests, benches and examples call `zbridge::dev_tracing::init_tracing()` to
//! see what the owner and forwarder threads are doing. Thread names are
//! included so `zbridge-owner-<id>` and `zbridge-fwd-<id>` lines can be told
//! apart. This is a no-op when `RUST_LOG` is not set or when a global
//! subscriber is already installed.

/// Install a `fmt` subscriber filtered by `RUST_LOG`, once.
pub fn init_tracing() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        // Best-effort: a second call (or another subscriber) makes this fail.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_thread_names(true)
            .try_init();
    }
}
