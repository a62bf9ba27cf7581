//! Server configuration
//!
//! Bind settings for the relay HTTP server and default port assignments.

use crate::error::{Result, ServerError};
use std::net::SocketAddr;
use std::time::Duration;

/// Default port assignments
pub mod ports {
    /// Relay HTTP port
    pub const RELAY_HTTP: u16 = 8080;
    /// Prometheus scrape port
    pub const METRICS: u16 = 9090;
}

/// Time allowed for in-flight requests to finish after shutdown is signalled
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP server configuration
///
/// # Example
///
/// ```
/// use server::config::ServerConfig;
///
/// let config = ServerConfig::new("0.0.0.0", 8080);
/// assert_eq!(config.http_port, 8080);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// HTTP port, 0 for an ephemeral port
    pub http_port: u16,
    /// Drain deadline once shutdown starts
    pub shutdown_timeout: Duration,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, http_port: u16) -> Self {
        Self {
            host: host.into(),
            http_port,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Loopback config on an ephemeral port
    pub fn ephemeral() -> Self {
        Self::new("127.0.0.1", 0)
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Get HTTP socket address
    pub fn http_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.http_port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.http_port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", ports::RELAY_HTTP)
    }
}
