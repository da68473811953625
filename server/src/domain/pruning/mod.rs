//! Usage-driven metrics pruning
//!
//! Walks an OTLP metrics request and removes data points whose
//! `(job, metric name)` pair the usage oracle reports as unused. Containers
//! left empty (metrics, scopes, resources) are removed bottom-up.
//!
//! Oracle failures never cause data loss: a pair whose usage cannot be
//! determined is kept.

mod decisions;
mod engine;
mod job;
mod points;
mod telemetry;

pub use decisions::DecisionCache;
pub use engine::{MetricsPruner, PruneSummary};
pub use job::{JOB_ATTRIBUTE_PRECEDENCE, resolve_job};
pub use points::MetricPoints;
pub use telemetry::{NoopTelemetry, PruneStats, PruneTelemetry, StatsSnapshot};
