//! Domain logic for usage-driven metrics pruning
//!
//! - `usage` - client for the remote usage oracle
//! - `pruning` - removes unused data points from OTLP metrics batches
//! - `forward` - OTLP/HTTP export of pruned batches
//! - `metrics` - pipeline tying pruning and forwarding together

pub mod forward;
pub mod metrics;
pub mod pruning;
pub mod usage;

pub use metrics::MetricsPipeline;
