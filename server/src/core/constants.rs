// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Metric Pruner";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "metric-pruner";

/// Crate name as it appears in tracing targets
pub const LOG_TARGET: &str = "metric_pruner";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".metric-pruner";

/// User agent sent to the usage oracle and downstream exporter
pub const USER_AGENT: &str = concat!("metric-pruner/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "metric-pruner.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "METRIC_PRUNER_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "METRIC_PRUNER_HOST";

/// Environment variable for OTLP/HTTP port
pub const ENV_PORT: &str = "METRIC_PRUNER_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "METRIC_PRUNER_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default OTLP/HTTP port (standard OTLP HTTP port)
pub const DEFAULT_PORT: u16 = 4318;

// =============================================================================
// OpenTelemetry
// =============================================================================

/// Environment variable for OTLP gRPC enabled
pub const ENV_OTEL_GRPC_ENABLED: &str = "METRIC_PRUNER_OTEL_GRPC_ENABLED";

/// Environment variable for OTLP gRPC port
pub const ENV_OTEL_GRPC_PORT: &str = "METRIC_PRUNER_OTEL_GRPC_PORT";

/// Default OTLP gRPC port (standard OTLP gRPC port)
pub const DEFAULT_OTEL_GRPC_PORT: u16 = 4317;

// =============================================================================
// Usage Oracle
// =============================================================================

/// Environment variable for the usage oracle base address
pub const ENV_USAGE_ADDRESS: &str = "METRIC_PRUNER_USAGE_ADDRESS";

/// Environment variable for the usage oracle request timeout
pub const ENV_USAGE_TIMEOUT_MS: &str = "METRIC_PRUNER_USAGE_TIMEOUT_MS";

/// Environment variable to disable TLS verification towards the usage oracle
pub const ENV_USAGE_INSECURE_SKIP_VERIFY: &str = "METRIC_PRUNER_USAGE_INSECURE_SKIP_VERIFY";

/// Path of the unused-metric lookup, appended to the oracle address
pub const USAGE_LOOKUP_PATH: &str = "/api/v1/metrics/unused";

/// Default usage oracle request timeout (10 seconds)
pub const USAGE_DEFAULT_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// Downstream Exporter
// =============================================================================

/// Environment variable for the downstream OTLP/HTTP endpoint
pub const ENV_EXPORTER_ENDPOINT: &str = "METRIC_PRUNER_EXPORTER_ENDPOINT";

/// Environment variable for the downstream export timeout
pub const ENV_EXPORTER_TIMEOUT_MS: &str = "METRIC_PRUNER_EXPORTER_TIMEOUT_MS";

/// Path of the OTLP/HTTP metrics export, appended to the exporter endpoint
pub const EXPORTER_METRICS_PATH: &str = "/v1/metrics";

/// Default downstream export timeout (10 seconds)
pub const EXPORTER_DEFAULT_TIMEOUT_MS: u64 = 10_000;

// =============================================================================
// Pruning Stats
// =============================================================================

/// Distinct jobs tracked by the stats endpoint, overflow bucket included
pub const MAX_TRACKED_JOBS: usize = 1_000;

/// Job key that absorbs counters once `MAX_TRACKED_JOBS` is reached
pub const OVERFLOW_JOB: &str = "_other";

// =============================================================================
// Request Body Limits
// =============================================================================

/// Body limit for OTLP endpoints (64 MB)
pub const OTLP_BODY_LIMIT: usize = 64 * 1024 * 1024;

// =============================================================================
// Backpressure / Shutdown
// =============================================================================

/// Retry-After header value when the downstream export fails
pub const BACKPRESSURE_RETRY_AFTER_SECS: u64 = 1;

/// Maximum time to wait for registered tasks during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
