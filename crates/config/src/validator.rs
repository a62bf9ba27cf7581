use crate::*;
use regex::Regex;
use thiserror::Error;
use url::Url;

/// Body size above which a limit draws a warning: 200 MiB
const LARGE_BODY_LIMIT_BYTES: usize = 200 * 1024 * 1024;

const LOG_FORMATS: &[&str] = &["pretty", "json", "compact"];

const BRIDGE_SCHEMES: &[&str] = &["http", "https"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Gateway name is required")]
    MissingGatewayName,

    #[error("Invalid version format: {0}. Must be in format X.Y.Z (e.g., 1.0.0)")]
    InvalidVersionFormat(String),

    #[error("Server host is required")]
    MissingHost,

    #[error("{field} must be a non-zero port")]
    InvalidPort { field: String },

    #[error("telemetry.metrics_port {port} collides with server.http_port")]
    PortConflict { port: u16 },

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("device_transport.bridge_url is required")]
    MissingBridgeUrl,

    #[error("device_transport.bridge_url '{url}': {message}")]
    InvalidBridgeUrl { url: String, message: String },

    #[error("blob_storage.allowed_schemes must list at least one scheme")]
    NoAllowedSchemes,

    #[error("Invalid log format: {0}. Must be one of: pretty, json, compact")]
    InvalidLogFormat(String),

    #[error("Invalid metric prefix: {0}. Must match [a-zA-Z_][a-zA-Z0-9_]*")]
    InvalidMetricPrefix(String),

    #[error("Environment variable '{var}' is missing or invalid: {message}")]
    InvalidEnvVar { var: String, message: String },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &RelayConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_env_vars(config, &mut report);
    validate_gateway(&config.gateway, &mut report);
    validate_server(&config.server, &config.telemetry, &mut report);
    validate_limits(&config.limits, &mut report);
    validate_device_transport(&config.device_transport, &mut report);
    validate_blob_storage(&config.blob_storage, &mut report);
    validate_telemetry(&config.telemetry, &mut report);

    report
}

fn validate_env_vars(config: &RelayConfig, report: &mut ValidationReport) {
    let fields = [
        ("gateway.name", config.gateway.name.as_str()),
        ("gateway.version", config.gateway.version.as_str()),
        ("server.host", config.server.host.as_str()),
        ("device_transport.bridge_url", config.device_transport.bridge_url.as_str()),
        ("telemetry.log_format", config.telemetry.log_format.as_str()),
        ("telemetry.prefix", config.telemetry.prefix.as_str()),
    ];

    for (field, value) in fields {
        for var in unresolved_env_vars(value) {
            report.add_error(ValidationError::InvalidEnvVar {
                var,
                message: format!("referenced by {} but not set", field),
            });
        }
    }
}

fn validate_gateway(gateway: &GatewayConfig, report: &mut ValidationReport) {
    if gateway.name.trim().is_empty() {
        report.add_error(ValidationError::MissingGatewayName);
    }

    let version_regex = Regex::new(r"^\d+\.\d+\.\d+$").expect("version pattern is a valid regex");
    if !version_regex.is_match(&gateway.version) {
        report.add_error(ValidationError::InvalidVersionFormat(gateway.version.clone()));
    }
}

fn validate_server(server: &ServerConfig, telemetry: &TelemetryConfig, report: &mut ValidationReport) {
    if server.host.trim().is_empty() {
        report.add_error(ValidationError::MissingHost);
    }

    if server.http_port == 0 {
        report.add_error(ValidationError::InvalidPort {
            field: "server.http_port".to_string(),
        });
    }

    match telemetry.metrics_port {
        Some(0) => report.add_error(ValidationError::InvalidPort {
            field: "telemetry.metrics_port".to_string(),
        }),
        Some(port) if port == server.http_port => {
            report.add_error(ValidationError::PortConflict { port })
        }
        Some(_) => {}
        None => report.add_default("telemetry.metrics_port", "disabled"),
    }
}

fn validate_limits(limits: &LimitsConfig, report: &mut ValidationReport) {
    for (field, value) in [
        ("limits.post_body_limit_bytes", limits.post_body_limit_bytes),
        ("limits.default_body_limit_bytes", limits.default_body_limit_bytes),
    ] {
        if value == 0 {
            report.add_error(ValidationError::InvalidPositiveInteger {
                field: field.to_string(),
            });
        } else if value > LARGE_BODY_LIMIT_BYTES {
            report.add_warning(
                field,
                &format!("{} bytes exceeds 200 MiB; large bodies are held in memory", value),
            );
        }
    }

    if limits.default_body_limit_bytes > limits.post_body_limit_bytes {
        report.add_warning(
            "limits.default_body_limit_bytes",
            "default limit is larger than the POST limit",
        );
    }
}

fn validate_device_transport(transport: &DeviceTransportConfig, report: &mut ValidationReport) {
    let bridge_url = transport.bridge_url.trim();
    if bridge_url.is_empty() {
        report.add_error(ValidationError::MissingBridgeUrl);
    } else if !has_unresolved_env_vars(bridge_url) {
        match Url::parse(bridge_url) {
            Ok(url) if !BRIDGE_SCHEMES.contains(&url.scheme()) => {
                report.add_error(ValidationError::InvalidBridgeUrl {
                    url: bridge_url.to_string(),
                    message: format!("scheme '{}' is not http or https", url.scheme()),
                });
            }
            Ok(_) => {}
            Err(e) => report.add_error(ValidationError::InvalidBridgeUrl {
                url: bridge_url.to_string(),
                message: e.to_string(),
            }),
        }
    }

    match transport.timeout_seconds {
        Some(0) => report.add_error(ValidationError::InvalidPositiveInteger {
            field: "device_transport.timeout_seconds".to_string(),
        }),
        Some(_) => {}
        None => report.add_default("device_transport.timeout_seconds", "none"),
    }
}

fn validate_blob_storage(blob_storage: &BlobStorageConfig, report: &mut ValidationReport) {
    if blob_storage.allowed_schemes.is_empty() {
        report.add_error(ValidationError::NoAllowedSchemes);
    }

    for scheme in &blob_storage.allowed_schemes {
        if !BRIDGE_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
            report.add_warning(
                "blob_storage.allowed_schemes",
                &format!("scheme '{}' cannot be read by the HTTP blob client", scheme),
            );
        }
    }

    if blob_storage.connect_timeout_seconds == Some(0) {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "blob_storage.connect_timeout_seconds".to_string(),
        });
    }
}

fn validate_telemetry(telemetry: &TelemetryConfig, report: &mut ValidationReport) {
    if !LOG_FORMATS.contains(&telemetry.log_format.to_lowercase().as_str()) {
        report.add_error(ValidationError::InvalidLogFormat(telemetry.log_format.clone()));
    }

    let prefix_regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("prefix pattern is a valid regex");
    if !prefix_regex.is_match(&telemetry.prefix) {
        report.add_error(ValidationError::InvalidMetricPrefix(telemetry.prefix.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let report = validate_config(&generate_default_config());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_bridge_url_must_be_http() {
        let mut config = generate_default_config();
        config.device_transport.bridge_url = "ftp://bridge.local".to_string();
        let report = validate_config(&config);
        assert!(matches!(
            report.errors.as_slice(),
            [ValidationError::InvalidBridgeUrl { .. }]
        ));

        config.device_transport.bridge_url = "not a url".to_string();
        assert!(!validate_config(&config).is_valid());
    }

    #[test]
    fn test_unresolved_placeholder_is_an_error() {
        let mut config = generate_default_config();
        config.device_transport.bridge_url = "${DEVICE_BRIDGE_URL}".to_string();

        let report = validate_config(&config);
        assert_eq!(
            report.errors,
            vec![ValidationError::InvalidEnvVar {
                var: "DEVICE_BRIDGE_URL".to_string(),
                message: "referenced by device_transport.bridge_url but not set".to_string(),
            }]
        );
    }

    #[test]
    fn test_ports_must_be_distinct_and_non_zero() {
        let mut config = generate_default_config();
        config.telemetry.metrics_port = Some(config.server.http_port);
        assert_eq!(
            validate_config(&config).errors,
            vec![ValidationError::PortConflict { port: 8080 }]
        );

        config.telemetry.metrics_port = None;
        config.server.http_port = 0;
        let report = validate_config(&config);
        assert!(!report.is_valid());
        assert!(report
            .defaults_applied
            .iter()
            .any(|d| d.field == "telemetry.metrics_port"));
    }

    #[test]
    fn test_limits() {
        let mut config = generate_default_config();
        config.limits.post_body_limit_bytes = 0;
        assert!(!validate_config(&config).is_valid());

        config.limits.post_body_limit_bytes = 512 * 1024 * 1024;
        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].field, "limits.post_body_limit_bytes");
    }

    #[test]
    fn test_telemetry_fields() {
        let mut config = generate_default_config();
        config.telemetry.log_format = "xml".to_string();
        config.telemetry.prefix = "cloud-relay".to_string();

        let errors = validate_config(&config).errors;
        assert!(errors.contains(&ValidationError::InvalidLogFormat("xml".to_string())));
        assert!(errors.contains(&ValidationError::InvalidMetricPrefix("cloud-relay".to_string())));
    }
}
