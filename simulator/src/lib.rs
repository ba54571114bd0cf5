pub mod admin;
pub mod client;
pub mod config;
pub mod device;
pub mod errors;
pub mod lifecycle;
pub mod telemetry;

use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber on stderr, honouring `RUST_LOG` and defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
