//! The API process uses the single shared [`thumbcache_config::AppConfig`]
//! directly rather than keeping a parallel ambient-only config struct -
//! every knob this process reads (bind address, queue thresholds, the
//! status token) already lives in one of `AppConfig`'s sections.

pub use thumbcache_config::AppConfig as ApiConfig;

use std::net::SocketAddr;

use thumbcache_config::AppConfig;

/// Parse the configured host/port into a bindable address.
pub fn bind_address(config: &AppConfig) -> Result<SocketAddr, std::net::AddrParseError> {
    format!("{}:{}", config.server.host, config.server.port).parse()
}
