use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Load a configuration file, substituting environment variables first
#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RelayConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    let config = parse_config(&content)?;
    info!("Configuration loaded successfully");
    Ok(config)
}

/// Parse configuration text, substituting environment variables first
pub fn parse_config(content: &str) -> Result<RelayConfig> {
    let substituted = substitution::substitute_env_vars(content);
    serde_yaml::from_str(&substituted).with_context(|| "Failed to parse YAML configuration")
}

/// A complete configuration with every default spelled out
pub fn generate_default_config() -> RelayConfig {
    use defaults::*;

    RelayConfig {
        gateway: GatewayConfig {
            name: "cloudrelay".to_string(),
            version: default_version(),
        },
        server: ServerConfig::default(),
        limits: LimitsConfig::default(),
        device_transport: DeviceTransportConfig {
            bridge_url: default_bridge_url(),
            timeout_seconds: Some(120),
        },
        blob_storage: BlobStorageConfig {
            connect_timeout_seconds: Some(10),
            allowed_schemes: default_allowed_schemes(),
        },
        telemetry: TelemetryConfig {
            metrics_port: Some(default_metrics_port()),
            ..TelemetryConfig::default()
        },
    }
}

#[instrument(skip(config))]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &RelayConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = parse_config(
            r#"
gateway:
  name: edge-relay
device_transport:
  bridge_url: http://bridge.local:9000
"#,
        )
        .unwrap();

        assert_eq!(config.gateway.version, "1.0.0");
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.limits.post_body_limit_bytes, 209_715_200);
        assert_eq!(config.limits.default_body_limit_bytes, 30_000_000);
        assert_eq!(config.device_transport.timeout_seconds, None);
        assert_eq!(config.blob_storage.allowed_schemes, vec!["https", "http"]);
        assert_eq!(config.telemetry.log_format, "pretty");
        assert_eq!(config.telemetry.metrics_port, None);
    }

    #[test]
    fn test_missing_required_section_fails() {
        assert!(parse_config("gateway:\n  name: edge-relay\n").is_err());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("cloudrelay-config-{}.yaml", std::process::id()));
        let config = generate_default_config();

        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = load_config("/nonexistent/cloudrelay.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
