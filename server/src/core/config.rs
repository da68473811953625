use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::forward::ExporterConfig;
use crate::domain::usage::UsageOracleConfig;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_OTEL_GRPC_PORT, DEFAULT_PORT,
    EXPORTER_DEFAULT_TIMEOUT_MS, USAGE_DEFAULT_TIMEOUT_MS,
};

// =============================================================================
// File Config Structs (all fields optional, merged across files)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// gRPC configuration (nested under otel)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GrpcFileConfig {
    pub enabled: Option<bool>,
    pub port: Option<u16>,
}

/// OpenTelemetry configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OtelFileConfig {
    pub grpc: Option<GrpcFileConfig>,
}

/// TLS settings towards the usage oracle (nested under usage)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UsageTlsFileConfig {
    pub insecure_skip_verify: Option<bool>,
}

/// Usage oracle configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UsageFileConfig {
    pub address: Option<String>,
    pub timeout_ms: Option<u64>,
    pub tls: Option<UsageTlsFileConfig>,
}

/// Downstream exporter configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExporterFileConfig {
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub otel: Option<OtelFileConfig>,
    pub usage: Option<UsageFileConfig>,
    pub exporter: Option<ExporterFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        if let Some(otel) = other.otel {
            let current = self.otel.get_or_insert_with(OtelFileConfig::default);
            if let Some(grpc) = otel.grpc {
                let current_grpc = current.grpc.get_or_insert_with(GrpcFileConfig::default);
                if grpc.enabled.is_some() {
                    tracing::trace!(enabled = ?grpc.enabled, "Merging otel.grpc.enabled");
                    current_grpc.enabled = grpc.enabled;
                }
                if grpc.port.is_some() {
                    tracing::trace!(port = ?grpc.port, "Merging otel.grpc.port");
                    current_grpc.port = grpc.port;
                }
            }
        }

        if let Some(usage) = other.usage {
            let current = self.usage.get_or_insert_with(UsageFileConfig::default);
            if usage.address.is_some() {
                tracing::trace!(address = ?usage.address, "Merging usage.address");
                current.address = usage.address;
            }
            if usage.timeout_ms.is_some() {
                tracing::trace!(timeout_ms = ?usage.timeout_ms, "Merging usage.timeout_ms");
                current.timeout_ms = usage.timeout_ms;
            }
            if let Some(tls) = usage.tls {
                let current_tls = current.tls.get_or_insert_with(UsageTlsFileConfig::default);
                if tls.insecure_skip_verify.is_some() {
                    tracing::trace!(
                        insecure_skip_verify = ?tls.insecure_skip_verify,
                        "Merging usage.tls.insecure_skip_verify"
                    );
                    current_tls.insecure_skip_verify = tls.insecure_skip_verify;
                }
            }
        }

        if let Some(exporter) = other.exporter {
            let current = self.exporter.get_or_insert_with(ExporterFileConfig::default);
            if exporter.endpoint.is_some() {
                tracing::trace!(endpoint = ?exporter.endpoint, "Merging exporter.endpoint");
                current.endpoint = exporter.endpoint;
            }
            if exporter.timeout_ms.is_some() {
                tracing::trace!(timeout_ms = ?exporter.timeout_ms, "Merging exporter.timeout_ms");
                current.timeout_ms = exporter.timeout_ms;
            }
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// OpenTelemetry receiver configuration
#[derive(Debug, Clone)]
pub struct OtelConfig {
    pub grpc_enabled: bool,
    pub grpc_port: u16,
}

/// Usage oracle configuration
#[derive(Debug, Clone)]
pub struct UsageConfig {
    pub address: String,
    pub timeout_ms: u64,
    pub insecure_skip_verify: bool,
}

impl UsageConfig {
    pub fn oracle_config(&self) -> UsageOracleConfig {
        UsageOracleConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            insecure_skip_verify: self.insecure_skip_verify,
            ..UsageOracleConfig::new(self.address.clone())
        }
    }
}

/// Downstream exporter configuration (absent = pruned batches are not forwarded)
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl ExportConfig {
    pub fn exporter_config(&self) -> ExporterConfig {
        ExporterConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            ..ExporterConfig::new(self.endpoint.clone())
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub otel: OtelConfig,
    pub usage: UsageConfig,
    pub exporter: Option<ExportConfig>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.metric-pruner/metric-pruner.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::layer(cli, file_config);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            grpc_enabled = config.otel.grpc_enabled,
            grpc_port = config.otel.grpc_port,
            usage_address = %config.usage.address,
            exporter = config.exporter.as_ref().map(|e| e.endpoint.as_str()),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_otel = file_config.otel.unwrap_or_default();
        let file_grpc = file_otel.grpc.unwrap_or_default();
        let file_usage = file_config.usage.unwrap_or_default();
        let file_usage_tls = file_usage.tls.unwrap_or_default();
        let file_exporter = file_config.exporter.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let otel = OtelConfig {
            grpc_enabled: cli.otel_grpc.or(file_grpc.enabled).unwrap_or(true),
            grpc_port: cli
                .otel_grpc_port
                .or(file_grpc.port)
                .unwrap_or(DEFAULT_OTEL_GRPC_PORT),
        };

        let usage = UsageConfig {
            address: cli
                .usage_address
                .clone()
                .or(file_usage.address)
                .unwrap_or_default(),
            timeout_ms: cli
                .usage_timeout_ms
                .or(file_usage.timeout_ms)
                .unwrap_or(USAGE_DEFAULT_TIMEOUT_MS),
            insecure_skip_verify: cli
                .usage_insecure_skip_verify
                .or(file_usage_tls.insecure_skip_verify)
                .unwrap_or(false),
        };

        let exporter = cli
            .exporter_endpoint
            .clone()
            .or(file_exporter.endpoint)
            .map(|endpoint| ExportConfig {
                endpoint,
                timeout_ms: cli
                    .exporter_timeout_ms
                    .or(file_exporter.timeout_ms)
                    .unwrap_or(EXPORTER_DEFAULT_TIMEOUT_MS),
            });

        Self {
            server,
            otel,
            usage,
            exporter,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port 0 would bind to a random port
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if self.otel.grpc_enabled && self.otel.grpc_port == 0 {
            anyhow::bail!("Configuration error: otel.grpc.port must be greater than 0");
        }

        if self.otel.grpc_enabled && self.server.port == self.otel.grpc_port {
            anyhow::bail!(
                "Configuration error: server.port ({}) and otel.grpc.port ({}) cannot be the same",
                self.server.port,
                self.otel.grpc_port
            );
        }

        if self.usage.address.trim().is_empty() {
            anyhow::bail!("Configuration error: usage.address: server address is required");
        }
        if self.usage.timeout_ms == 0 {
            anyhow::bail!("Configuration error: usage.timeout_ms must be greater than 0");
        }

        if let Some(exporter) = &self.exporter {
            if exporter.endpoint.trim().is_empty() {
                anyhow::bail!("Configuration error: exporter.endpoint must not be empty");
            }
            if exporter.timeout_ms == 0 {
                anyhow::bail!("Configuration error: exporter.timeout_ms must be greater than 0");
            }
        }

        if self.usage.insecure_skip_verify {
            tracing::warn!(
                address = %self.usage.address,
                "usage.tls.insecure_skip_verify is enabled, oracle certificates are not verified"
            );
        }

        if self.exporter.is_none() {
            tracing::warn!(
                "No exporter.endpoint configured, pruned batches will be acknowledged and discarded"
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.metric-pruner/metric-pruner.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
