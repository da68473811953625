//! OTLP/HTTP metrics exporter

use std::time::Duration;

use async_trait::async_trait;
use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use prost::Message;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;

use super::error::ExportError;
use crate::core::constants::{EXPORTER_DEFAULT_TIMEOUT_MS, EXPORTER_METRICS_PATH, USER_AGENT};

const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Destination for pruned batches
#[async_trait]
pub trait MetricsExporter: Send + Sync {
    async fn export(&self, request: &ExportMetricsServiceRequest) -> Result<(), ExportError>;
}

/// Connection settings for the downstream OTLP/HTTP endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Base endpoint, e.g. `http://collector:4318`
    pub endpoint: String,
    pub timeout: Duration,
}

impl ExporterConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_millis(EXPORTER_DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Posts protobuf-encoded batches to `{endpoint}/v1/metrics`
#[derive(Debug, Clone)]
pub struct OtlpHttpExporter {
    client: reqwest::Client,
    url: Url,
}

impl OtlpHttpExporter {
    pub fn new(config: &ExporterConfig) -> Result<Self, ExportError> {
        let endpoint = config.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ExportError::Config("endpoint is required".to_string()));
        }

        let url = Url::parse(&format!(
            "{}{}",
            endpoint.trim_end_matches('/'),
            EXPORTER_METRICS_PATH
        ))
        .map_err(|e| ExportError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ExportError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(url = %url, "OTLP exporter initialized");

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl MetricsExporter for OtlpHttpExporter {
    async fn export(&self, request: &ExportMetricsServiceRequest) -> Result<(), ExportError> {
        let body = request.encode_to_vec();
        tracing::trace!(url = %self.url, bytes = body.len(), "Forwarding metrics batch");

        let resp = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(ExportError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExportError::Http {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
