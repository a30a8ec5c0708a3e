//! Diagnostic logging setup
//!
//! Reports go to stdout; tracing output goes to stderr so the two never mix.
//! `GROVE_LOG` takes any `EnvFilter` directive and wins over `--debug`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV_VAR: &str = "GROVE_LOG";

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "grove=debug"
    } else {
        "warn"
    }
}

/// Builds the filter from `GROVE_LOG`, falling back to the `--debug` level
pub fn log_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_directive(debug)))
}

/// Installs the global subscriber. Calling it twice is harmless.
pub fn init_logging(debug: bool) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(console::colors_enabled_stderr())
        .with_filter(log_filter(debug));

    let _ = tracing_subscriber::registry().with(layer).try_init();
}
