use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Directive used when RUST_LOG is not set
fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Initialize logging to stderr so stdout stays clean for results.
///
/// RUST_LOG takes precedence; otherwise `info`, or `debug` when verbose.
pub fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::debug!("Logging initialized");
}
