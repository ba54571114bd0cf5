pub mod db;
pub mod errors;
pub mod rest;

use tracing_subscriber::EnvFilter;

/// Logs go to stderr so failures of the command line tools land on the error stream.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
