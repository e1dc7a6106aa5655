//! Diagnostic tracing for the CLI.
//!
//! Results go to stdout; tracing goes to stderr so `gmenv serve` keeps its
//! protocol stream clean.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level is `warn`, or `debug` for
/// this crate when `debug` is true. Repeated calls are ignored.
///
/// # Example
/// ```bash
/// RUST_LOG=gmenv::engine=debug gmenv simulate demos/three_build.json
/// ```
pub fn init(debug: bool) {
    let fallback = if debug { "warn,gmenv=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
