// lib: sockio facade for I/O frameworks that drive transports through a fixed operation table
// Settings are read once from the environment, see sockio_core::settings

// Re-export core types and options
pub use sockio_core::*;

// Re-export transport abstractions
pub use sockio_transport::*;

use once_cell::sync::Lazy;
use std::net::TcpStream;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SOCKIO_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

// Process-wide settings - initialized lazily and never dropped
static SETTINGS: Lazy<TransportSettings> = Lazy::new(|| {
    let settings = TransportSettings::from_env();
    tracing::debug!(recv_buffer_size = settings.recv_buffer_size, "transport settings loaded");
    settings
});

/// Settings every transport created through this crate uses.
pub fn settings() -> &'static TransportSettings {
    &SETTINGS
}

/// Creates a TCP transport with the process-wide settings.
pub fn create_socketio(config: SocketIoConfig<TcpStream>) -> Result<TcpSocketIo> {
    TcpSocketIo::with_settings(config, settings())
}

/// Creates a TCP transport behind the operation table.
pub fn create_transport(config: SocketIoConfig<TcpStream>) -> Result<Box<dyn IoInterface>> {
    Ok(Box::new(create_socketio(config)?))
}

/// Installs a fmt subscriber filtered by `SOCKIO_LOG` (default: info).
///
/// Libraries never call this; binaries do, once, before creating transports.
/// Returns false when a global subscriber was already installed.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
