use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/relay.yaml";

#[derive(Parser, Debug)]
#[command(name = "relayd")]
#[command(about = "CloudRelay - relays HTTP requests to remote devices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the relay gateway
    Start {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Override the HTTP port
        #[arg(long)]
        http: Option<u16>,

        /// Override the Prometheus scrape port
        #[arg(long)]
        metrics_port: Option<u16>,

        /// Override the log format
        #[arg(long, value_enum)]
        log_format: Option<LogFormatArg>,
    },

    /// Validate configuration without starting the relay
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Write a configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "relay.yaml")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable multi-line output
    Pretty,
    /// One JSON object per line
    Json,
    /// Single-line output
    Compact,
}

impl LogFormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormatArg::Pretty => "pretty",
            LogFormatArg::Json => "json",
            LogFormatArg::Compact => "compact",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_defaults() {
        let cli = Cli::try_parse_from(["relayd", "start"]).unwrap();
        match cli.command {
            Commands::Start {
                config,
                http,
                metrics_port,
                log_format,
            } => {
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG_PATH));
                assert_eq!(http, None);
                assert_eq!(metrics_port, None);
                assert_eq!(log_format, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_start_overrides() {
        let cli = Cli::try_parse_from([
            "relayd",
            "start",
            "-c",
            "/etc/relay.yaml",
            "--http",
            "8181",
            "--metrics-port",
            "9191",
            "--log-format",
            "json",
        ])
        .unwrap();

        let Commands::Start {
            config,
            http,
            metrics_port,
            log_format,
        } = cli.command
        else {
            panic!("expected start");
        };
        assert_eq!(config, PathBuf::from("/etc/relay.yaml"));
        assert_eq!(http, Some(8181));
        assert_eq!(metrics_port, Some(9191));
        assert_eq!(log_format.map(|f| f.as_str()), Some("json"));
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["relayd", "start", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_init_output() {
        let cli = Cli::try_parse_from(["relayd", "init", "--output", "out.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { output } if output == PathBuf::from("out.yaml")));
    }

    #[test]
    fn test_validate_requires_no_args() {
        let cli = Cli::try_parse_from(["relayd", "validate"]).unwrap();
        assert!(matches!(cli.command, Commands::Validate { .. }));
    }
}
