#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

/// Stdout carries the protocol, so every log line goes to stderr.
pub(crate) fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
