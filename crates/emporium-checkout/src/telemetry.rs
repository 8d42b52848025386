//! Tracing setup for processes embedding the checkout engine.

use tracing_subscriber::EnvFilter;

/// Filter from `EMPORIUM_LOG`, then `RUST_LOG`, else `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("EMPORIUM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global fmt subscriber.
///
/// A second call is a no-op, so tests and embedding binaries can both call it.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init();
}
