//! Configuration for CloudRelay
//!
//! The relay is configured from a single YAML file:
//!
//! ```yaml
//! gateway:
//!   name: cloudrelay
//!   version: 1.0.0
//! server:
//!   host: 0.0.0.0
//!   http_port: 8080
//! limits:
//!   post_body_limit_bytes: 209715200
//!   default_body_limit_bytes: 30000000
//! device_transport:
//!   bridge_url: ${DEVICE_BRIDGE_URL}
//!   timeout_seconds: 120
//! blob_storage:
//!   connect_timeout_seconds: 10
//!   allowed_schemes: [https, http]
//! telemetry:
//!   metrics_port: 9090
//!   log_format: json
//!   prefix: cloudrelay
//! ```
//!
//! `${VAR}` and `$VAR` are replaced from the environment before parsing;
//! `${VAR:-fallback}` supplies a fallback for unset variables.

use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelayConfig {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    pub device_transport: DeviceTransportConfig,
    #[serde(default)]
    pub blob_storage: BlobStorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

/// Request body ceilings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Applied to POST (body and multipart form)
    #[serde(default = "default_post_body_limit_bytes")]
    pub post_body_limit_bytes: usize,
    /// Applied to GET, PUT and DELETE
    #[serde(default = "default_body_limit_bytes")]
    pub default_body_limit_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            post_body_limit_bytes: default_post_body_limit_bytes(),
            default_body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceTransportConfig {
    /// Base url of the HTTP device bridge
    pub bridge_url: String,
    /// Round-trip timeout enforced by the transport client, none by default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlobStorageConfig {
    /// Connection setup timeout; downloads themselves are not time-boxed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_seconds: Option<u64>,
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,
}

impl Default for BlobStorageConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: None,
            allowed_schemes: default_allowed_schemes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Prometheus scrape port, exporter disabled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Prefix of the relay's own metric names
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_format: default_log_format(),
            prefix: default_metrics_prefix(),
        }
    }
}
