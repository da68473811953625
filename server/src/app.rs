//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{ApiServer, OtlpGrpcServer};
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{ENV_LOG, LOG_TARGET};
use crate::core::shutdown::ShutdownService;
use crate::domain::MetricsPipeline;
use crate::domain::forward::{MetricsExporter, OtlpHttpExporter};
use crate::domain::pruning::{MetricsPruner, PruneStats};
use crate::domain::usage::{HttpUsageClient, UsageOracle, UsageQuery};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub stats: Arc<PruneStats>,
    pub pipeline: Arc<MetricsPipeline>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Lookup { name, job }) => {
                return Self::lookup(&cli_config, UsageQuery::new(job, name)).await;
            }
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config)?;
        Self::start_server(app).await
    }

    /// Wire the oracle client, pruner and exporter from configuration
    pub fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let oracle: Arc<dyn UsageOracle> = Arc::new(
            HttpUsageClient::new(&config.usage.oracle_config())
                .context("Failed to initialize usage oracle client")?,
        );

        let exporter = match &config.exporter {
            Some(export) => {
                let exporter = OtlpHttpExporter::new(&export.exporter_config())
                    .context("Failed to initialize metrics exporter")?;
                Some(Arc::new(exporter) as Arc<dyn MetricsExporter>)
            }
            None => None,
        };

        let stats = Arc::new(PruneStats::new());
        let pruner = MetricsPruner::new(oracle, stats.clone());
        let pipeline = Arc::new(MetricsPipeline::new(pruner, exporter));

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            stats,
            pipeline,
        })
    }

    async fn lookup(cli: &CliConfig, query: UsageQuery) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let client = HttpUsageClient::new(&config.usage.oracle_config())
            .context("Failed to initialize usage oracle client")?;

        let verdict = client
            .lookup(&query)
            .await
            .with_context(|| format!("Usage lookup failed for {}", query))?;

        println!("{}", serde_json::to_string_pretty(&verdict)?);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", LOG_TARGET);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        if app.config.otel.grpc_enabled {
            let grpc_server = OtlpGrpcServer::new(
                &app.config.otel,
                &app.config.server.host,
                app.pipeline.clone(),
            )?;
            let shutdown_rx = app.shutdown.subscribe();
            let handle = tokio::spawn(async move {
                if let Err(e) = grpc_server.start(shutdown_rx).await {
                    tracing::error!(error = %e, "OTLP gRPC server error");
                }
            });

            app.shutdown.register(handle).await;
        }

        banner::print_banner(&app.config);

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
