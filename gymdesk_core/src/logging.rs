//! Logging infrastructure for Gymdesk.
//!
//! Centralized tracing setup, shared by the CLI and any future binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with a compact format and env-based filtering.
///
/// Defaults to WARN so the CLI output stays readable; override with the
/// RUST_LOG environment variable.
pub fn init() {
    init_with_level("warn")
}

/// Initialize logging with a specific default level, still overridable
/// by RUST_LOG.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}
