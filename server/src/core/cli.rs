use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_EXPORTER_ENDPOINT, ENV_EXPORTER_TIMEOUT_MS, ENV_HOST, ENV_OTEL_GRPC_ENABLED,
    ENV_OTEL_GRPC_PORT, ENV_PORT, ENV_USAGE_ADDRESS, ENV_USAGE_INSECURE_SKIP_VERIFY,
    ENV_USAGE_TIMEOUT_MS,
};

#[derive(Parser)]
#[command(name = "metric-pruner")]
#[command(
    version,
    about = "Drops OTLP metrics that no alert, dashboard or query uses",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// OTLP/HTTP port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Enable OTLP gRPC endpoint
    #[arg(long, global = true, env = ENV_OTEL_GRPC_ENABLED)]
    pub otel_grpc: Option<bool>,

    /// OTLP gRPC port
    #[arg(long, global = true, env = ENV_OTEL_GRPC_PORT)]
    pub otel_grpc_port: Option<u16>,

    /// Usage oracle base address (e.g. http://usage-oracle:8080)
    #[arg(long, global = true, env = ENV_USAGE_ADDRESS)]
    pub usage_address: Option<String>,

    /// Usage oracle request timeout in milliseconds
    #[arg(long, global = true, env = ENV_USAGE_TIMEOUT_MS)]
    pub usage_timeout_ms: Option<u64>,

    /// Skip TLS certificate verification towards the usage oracle (insecure)
    #[arg(long, global = true, env = ENV_USAGE_INSECURE_SKIP_VERIFY)]
    pub usage_insecure_skip_verify: Option<bool>,

    /// Downstream OTLP/HTTP endpoint that receives pruned batches
    #[arg(long, global = true, env = ENV_EXPORTER_ENDPOINT)]
    pub exporter_endpoint: Option<String>,

    /// Downstream export timeout in milliseconds
    #[arg(long, global = true, env = ENV_EXPORTER_TIMEOUT_MS)]
    pub exporter_timeout_ms: Option<u64>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the receiver (default command)
    Start,
    /// Ask the usage oracle about a single metric and print the verdict
    Lookup {
        /// Metric name
        name: String,
        /// Job the metric belongs to (empty when omitted)
        #[arg(long, short, default_value = "")]
        job: String,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub otel_grpc: Option<bool>,
    pub otel_grpc_port: Option<u16>,
    pub usage_address: Option<String>,
    pub usage_timeout_ms: Option<u64>,
    pub usage_insecure_skip_verify: Option<bool>,
    pub exporter_endpoint: Option<String>,
    pub exporter_timeout_ms: Option<u64>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            config: cli.config,
            otel_grpc: cli.otel_grpc,
            otel_grpc_port: cli.otel_grpc_port,
            usage_address: cli.usage_address,
            usage_timeout_ms: cli.usage_timeout_ms,
            usage_insecure_skip_verify: cli.usage_insecure_skip_verify,
            exporter_endpoint: cli.exporter_endpoint,
            exporter_timeout_ms: cli.exporter_timeout_ms,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let mut cli = Cli::parse();
    let command = cli.command.take();
    (CliConfig::from(cli), command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> (CliConfig, Option<Commands>) {
        let mut cli = Cli::try_parse_from(args).unwrap();
        let command = cli.command.take();
        (CliConfig::from(cli), command)
    }

    #[test]
    fn test_no_args() {
        let (config, command) = parse_from(&["metric-pruner"]);
        assert!(command.is_none());
        assert!(config.port.is_none());
        assert!(config.usage_address.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let (config, command) = parse_from(&[
            "metric-pruner",
            "start",
            "--usage-address",
            "http://oracle:8080",
            "--usage-insecure-skip-verify",
            "true",
            "-p",
            "9000",
        ]);
        assert!(matches!(command, Some(Commands::Start)));
        assert_eq!(config.usage_address.as_deref(), Some("http://oracle:8080"));
        assert_eq!(config.usage_insecure_skip_verify, Some(true));
        assert_eq!(config.port, Some(9000));
    }

    #[test]
    fn test_lookup_command() {
        let (_, command) = parse_from(&["metric-pruner", "lookup", "up", "--job", "node"]);
        match command {
            Some(Commands::Lookup { name, job }) => {
                assert_eq!(name, "up");
                assert_eq!(job, "node");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_lookup_default_job_is_empty() {
        let (_, command) = parse_from(&["metric-pruner", "lookup", "up"]);
        assert!(matches!(command, Some(Commands::Lookup { job, .. }) if job.is_empty()));
    }
}
