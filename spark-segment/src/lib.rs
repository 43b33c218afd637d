pub mod cli;
pub mod config;
pub mod embedding;
pub mod helper;
pub mod server;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber; `log` records are forwarded to it.
pub fn log_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
