//! Tracing subscriber setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Initialise logging. Verbosity from repeated `-v` flags; `GRABAR_LOG`
/// overrides everything.
pub fn init(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("GRABAR_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
