//! CloudRelay gateway binary
//!
//! Entry point for the relay: initializes, validates and starts the
//! gateway that forwards HTTP requests to devices.

use anyhow::{Context, Result};
use cli::{Cli, Commands, LogFormatArg};
use config::{generate_default_config, load_config, save_config, validate_config, RelayConfig, ValidationReport};
use observability::{init_logging, init_metrics, LogFormat};
use relay::{BodyLimits, DeviceRelay, HttpBlobStorage, HttpDeviceTransport, MetricsTelemetry, RelayApiState};
use server::{health_routes, HealthState, HttpServer, ServerConfig, ServerExt};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const SERVICE_NAME: &str = "relayd";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Start {
            config,
            http,
            metrics_port,
            log_format,
        } => start_relay(config, http, metrics_port, log_format).await,
        Commands::Validate { config } => {
            init_logging(SERVICE_NAME, LogFormat::Pretty)?;
            validate_command(config)
        }
        Commands::Init { output } => {
            init_logging(SERVICE_NAME, LogFormat::Pretty)?;
            init_command(output)
        }
    }
}

/// Apply command-line overrides on top of the file configuration
fn apply_overrides(
    config: &mut RelayConfig,
    http: Option<u16>,
    metrics_port: Option<u16>,
    log_format: Option<LogFormatArg>,
) {
    if let Some(port) = http {
        config.server.http_port = port;
    }
    if let Some(port) = metrics_port {
        config.telemetry.metrics_port = Some(port);
    }
    if let Some(format) = log_format {
        config.telemetry.log_format = format.as_str().to_string();
    }
}

async fn start_relay(
    config_path: PathBuf,
    http: Option<u16>,
    metrics_port: Option<u16>,
    log_format: Option<LogFormatArg>,
) -> Result<()> {
    let mut config = load_config(&config_path)?;
    apply_overrides(&mut config, http, metrics_port, log_format);

    let format = config.telemetry.log_format.parse::<LogFormat>().unwrap_or_default();
    init_logging(SERVICE_NAME, format)?;
    debug!(?config, "Configuration loaded");

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    if !report.is_valid() {
        error!(error_count = report.errors.len(), "Configuration validation failed");
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start relay due to configuration errors");
    }

    if let Some(port) = config.telemetry.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        init_metrics(addr)?;
        info!(%addr, "Prometheus exporter listening");
    }

    let transport = HttpDeviceTransport::new(
        &config.device_transport.bridge_url,
        config.device_transport.timeout_seconds.map(Duration::from_secs),
    )
    .context("Failed to create device transport")?;

    let blob_storage = HttpBlobStorage::new(
        config.blob_storage.connect_timeout_seconds.map(Duration::from_secs),
        config.blob_storage.allowed_schemes.clone(),
    )
    .context("Failed to create blob storage client")?;

    let limits = BodyLimits::new(
        config.limits.post_body_limit_bytes,
        config.limits.default_body_limit_bytes,
    );
    let device_relay = DeviceRelay::new(
        Arc::new(transport),
        Arc::new(blob_storage),
        Arc::new(MetricsTelemetry::new(config.telemetry.prefix.clone())),
    )
    .with_limits(limits);

    let health = Arc::new(HealthState::new(&config.gateway.name, &config.gateway.version));
    let router = health_routes(health).merge(relay::relay_routes(Arc::new(RelayApiState::new(Arc::new(
        device_relay,
    )))));

    info!(
        gateway = %config.gateway.name,
        version = %config.gateway.version,
        host = %config.server.host,
        http_port = config.server.http_port,
        bridge = %config.device_transport.bridge_url,
        post_limit = limits.post_bytes,
        default_limit = limits.default_bytes,
        "Starting relay"
    );

    let server = HttpServer::new(
        ServerConfig::new(config.server.host.clone(), config.server.http_port),
        router,
    );
    server.run_until_signal().await?;

    info!("Relay stopped");
    Ok(())
}

fn print_report(report: &ValidationReport) {
    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
    }
}

fn validate_command(config_path: PathBuf) -> Result<()> {
    info!(path = ?config_path, "Validating configuration");

    let config = load_config(&config_path)?;
    let report = validate_config(&config);
    print_report(&report);

    if !report.is_valid() {
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Gateway: {} {}", config.gateway.name, config.gateway.version);
    println!("Listen: {}:{}", config.server.host, config.server.http_port);
    println!("Device bridge: {}", config.device_transport.bridge_url);
    println!(
        "Body limits: POST {} bytes, other verbs {} bytes",
        config.limits.post_body_limit_bytes, config.limits.default_body_limit_bytes
    );

    Ok(())
}

fn init_command(output_path: PathBuf) -> Result<()> {
    let output_path: &Path = &output_path;
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Point device_transport.bridge_url at your device bridge");
    println!("  2. Run 'relayd validate --config {:?}' to check configuration", output_path);
    println!("  3. Run 'relayd start --config {:?}' to start the relay", output_path);

    Ok(())
}
