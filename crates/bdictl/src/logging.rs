//! Tracing setup for bdictl
//!
//! Logs go to stderr so stdout carries only the report (or JSON).
//! RUST_LOG wins when set; otherwise `warn`, or `debug` with --verbose.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default_directive = if verbose { "bdi_common=debug,bdictl=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}
