//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::Version;
use std::path::PathBuf;

/// Mocap Relay - per-frame rigid-body pose fan-out
#[derive(Parser, Debug)]
#[command(
    name = "mocap-relay",
    author,
    version,
    about = "Relay motion-capture rigid-body poses to pose / pose2d / odometry / tf channels",
    long_about = "Receives motion-capture frames (mock generator or recorded replay), converts \n\
                  every configured rigid body into the output coordinate convention and \n\
                  publishes it on its enabled channels through the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MOCAP_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "MOCAP_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "relay.toml", env = "MOCAP_RELAY_CONFIG")]
    pub config: PathBuf,

    /// Override the NatNet protocol version from configuration (e.g. 2.10)
    #[arg(long, env = "MOCAP_RELAY_NATNET_VERSION")]
    pub natnet_version: Option<Version>,

    /// Maximum number of frames to relay (0 = unlimited)
    #[arg(long, default_value = "0", env = "MOCAP_RELAY_MAX_FRAMES")]
    pub max_frames: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "MOCAP_RELAY_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Frame channel buffer size between source and dispatcher
    #[arg(long, default_value = "256", env = "MOCAP_RELAY_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "MOCAP_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show per-body channel details
    #[arg(long)]
    pub bodies: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_parse_version() {
        let cli = Cli::parse_from([
            "mocap-relay",
            "run",
            "--config",
            "relay.toml",
            "--natnet-version",
            "1.5",
            "--max-frames",
            "10",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.natnet_version, Some(Version::new(1, 5)));
                assert_eq!(args.max_frames, 10);
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_version_rejected() {
        let result = Cli::try_parse_from(["mocap-relay", "run", "--natnet-version", "three"]);
        assert!(result.is_err());
    }
}
