//! Tracing subscriber setup for binaries embedding the dispatcher.

use tracing_subscriber::EnvFilter;

/// Initialise a compact, env-filtered subscriber.
///
/// Honours `RUST_LOG`; without it, `postage` logs at debug level in debug
/// builds and info otherwise. Call once at startup.
pub fn init() {
    let default = if cfg!(debug_assertions) {
        "postage=debug"
    } else {
        "postage=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}
