//! HTTP client for the usage oracle

use async_trait::async_trait;
use reqwest::Url;

use super::error::OracleError;
use super::types::{UsageEnvelope, UsageOracleConfig, UsageQuery, UsageVerdict};
use crate::core::constants::{USAGE_LOOKUP_PATH, USER_AGENT};

/// Source of usage verdicts.
///
/// Implementations perform a single lookup with no retries; retry policy, if
/// any, belongs to the caller.
#[async_trait]
pub trait UsageOracle: Send + Sync {
    async fn lookup(&self, query: &UsageQuery) -> Result<UsageVerdict, OracleError>;
}

/// Usage oracle backed by `GET {address}/api/v1/metrics/unused`
#[derive(Debug, Clone)]
pub struct HttpUsageClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpUsageClient {
    pub fn new(config: &UsageOracleConfig) -> Result<Self, OracleError> {
        let address = config.address.trim();
        if address.is_empty() {
            return Err(OracleError::Config("server address is required".to_string()));
        }

        let endpoint = Url::parse(&format!(
            "{}{}",
            address.trim_end_matches('/'),
            USAGE_LOOKUP_PATH
        ))
        .map_err(|e| OracleError::Config(format!("invalid server address '{}': {}", address, e)))?;

        if config.insecure_skip_verify {
            tracing::warn!(
                address = %address,
                "TLS certificate verification disabled for usage oracle"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| OracleError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            endpoint = %endpoint,
            timeout_ms = config.timeout.as_millis(),
            "Usage oracle client initialized"
        );

        Ok(Self { client, endpoint })
    }

    /// Lookup URL with `job` and `name` query parameters (URL-encoded)
    fn lookup_url(&self, query: &UsageQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("job", &query.job)
            .append_pair("name", &query.metric_name);
        url
    }
}

#[async_trait]
impl UsageOracle for HttpUsageClient {
    async fn lookup(&self, query: &UsageQuery) -> Result<UsageVerdict, OracleError> {
        let url = self.lookup_url(query);
        tracing::trace!(url = %url, "Querying usage oracle");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(OracleError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OracleError::Http {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(OracleError::Transport)?;
        let envelope: UsageEnvelope = serde_json::from_slice(&body)?;

        match envelope.into_first() {
            Some(verdict) => Ok(verdict),
            None => {
                tracing::debug!(
                    job = %query.job,
                    metric = %query.metric_name,
                    "Usage oracle has no record, treating metric as used"
                );
                Ok(UsageVerdict::used(&query.metric_name))
            }
        }
    }
}
