//! Usage oracle client
//!
//! Looks up whether a `(job, metric name)` pair is used by any alert,
//! recording rule, dashboard or query, according to a remote usage service.

mod client;
mod error;
mod types;

pub use client::{HttpUsageClient, UsageOracle};
pub use error::OracleError;
pub use types::{UsageEnvelope, UsageOracleConfig, UsageQuery, UsageSummary, UsageVerdict};
