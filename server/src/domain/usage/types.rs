//! Usage oracle request/response types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::constants::USAGE_DEFAULT_TIMEOUT_MS;

/// Lookup key for the usage oracle.
///
/// Equality is exact on both fields. An empty job is valid and means no
/// identity could be resolved for the data point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsageQuery {
    pub job: String,
    pub metric_name: String,
}

impl UsageQuery {
    pub fn new(job: impl Into<String>, metric_name: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            metric_name: metric_name.into(),
        }
    }
}

impl fmt::Display for UsageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.job, self.metric_name)
    }
}

/// Usage counts reported alongside a verdict. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSummary {
    pub alert_count: i64,
    pub record_count: i64,
    pub dashboard_count: i64,
    pub query_count: i64,
}

/// Usage verdict for one metric
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageVerdict {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unused: bool,
    #[serde(default)]
    pub summary: Option<UsageSummary>,
}

impl UsageVerdict {
    /// Verdict used when the oracle has no record for a metric
    pub fn used(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unused: false,
            summary: None,
        }
    }
}

/// Response envelope of `/api/v1/metrics/unused`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageEnvelope {
    #[serde(default)]
    pub data: Option<Vec<UsageVerdict>>,
}

impl UsageEnvelope {
    /// First verdict in the envelope, if any. Further entries are ignored.
    pub fn into_first(self) -> Option<UsageVerdict> {
        self.data.and_then(|data| data.into_iter().next())
    }
}

/// Connection settings for the usage oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageOracleConfig {
    /// Base address, e.g. `https://usage.example.com`
    pub address: String,
    /// Bound on the whole request, connect included
    pub timeout: Duration,
    /// Disable certificate verification. Insecure; for test and
    /// self-signed deployments only.
    pub insecure_skip_verify: bool,
}

impl UsageOracleConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: Duration::from_millis(USAGE_DEFAULT_TIMEOUT_MS),
            insecure_skip_verify: false,
        }
    }
}
