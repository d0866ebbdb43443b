//! Diagnostic tracing for the search core and host loop.
//!
//! Reads `RUST_LOG` (e.g. `RUST_LOG=gridwalk=debug`); defaults to `warn`.
//! Output goes to stderr so per-tick CLI output on stdout stays clean.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
