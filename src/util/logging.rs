//! Logging setup
//!
//! One `tracing` subscriber for the whole process, writing to stderr so that
//! standalone mode keeps stdout for the client. `RUST_LOG` wins over the
//! `--debug` default.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "textpulse=debug,info"
    } else {
        "info"
    }
}

/// Install the global subscriber
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug)
        .with_thread_names(debug);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
