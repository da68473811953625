//! Pruning instrumentation
//!
//! The pruner reports through an injected [`PruneTelemetry`] rather than
//! process-wide counters. [`PruneStats`] is the in-memory implementation
//! served by the stats endpoint; [`NoopTelemetry`] discards everything.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;

use super::engine::PruneSummary;
use crate::core::constants::{MAX_TRACKED_JOBS, OVERFLOW_JOB};
use crate::domain::usage::OracleError;

/// Sink for pruning events. All methods default to no-ops.
pub trait PruneTelemetry: Send + Sync {
    /// One oracle round trip finished (successfully or not)
    fn record_lookup(&self, _duration: Duration) {}

    /// The oracle failed for a job; the pair was kept
    fn record_lookup_error(&self, _job: &str, _error: &OracleError) {}

    /// The oracle reported a pair as unused
    fn record_unused(&self, _job: &str) {}

    /// The oracle reported a pair as used
    fn record_used(&self, _job: &str) {}

    /// Data points removed for a job
    fn record_dropped_data_points(&self, _job: &str, _count: u64) {}

    /// A whole batch finished pruning
    fn record_batch(&self, _summary: &PruneSummary) {}
}

/// Telemetry sink that records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl PruneTelemetry for NoopTelemetry {}

#[derive(Debug, Default)]
struct JobCounters {
    unused: AtomicU64,
    used: AtomicU64,
    errors: AtomicU64,
    dropped_data_points: AtomicU64,
}

/// In-memory counters for the pruner.
///
/// Job keys come from incoming data, so at most `job_limit` keys are kept;
/// jobs first seen after that are counted under [`OVERFLOW_JOB`].
#[derive(Debug)]
pub struct PruneStats {
    batches: AtomicU64,
    lookups: AtomicU64,
    lookup_errors: AtomicU64,
    unused_verdicts: AtomicU64,
    used_verdicts: AtomicU64,
    dropped_data_points: AtomicU64,
    dropped_metrics: AtomicU64,
    lookup_micros_total: AtomicU64,
    lookup_micros_max: AtomicU64,
    jobs: DashMap<String, JobCounters>,
    job_limit: usize,
}

impl Default for PruneStats {
    fn default() -> Self {
        Self::with_job_limit(MAX_TRACKED_JOBS)
    }
}

impl PruneStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job_limit(job_limit: usize) -> Self {
        Self {
            batches: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            lookup_errors: AtomicU64::new(0),
            unused_verdicts: AtomicU64::new(0),
            used_verdicts: AtomicU64::new(0),
            dropped_data_points: AtomicU64::new(0),
            dropped_metrics: AtomicU64::new(0),
            lookup_micros_total: AtomicU64::new(0),
            lookup_micros_max: AtomicU64::new(0),
            jobs: DashMap::new(),
            job_limit: job_limit.max(1),
        }
    }

    fn with_job(&self, job: &str, f: impl FnOnce(&JobCounters)) {
        if let Some(counters) = self.jobs.get(job) {
            f(&counters);
            return;
        }

        // One slot stays free for the overflow bucket
        let key = if self.jobs.len() + 1 < self.job_limit {
            job
        } else {
            OVERFLOW_JOB
        };
        let counters = self.jobs.entry(key.to_string()).or_default();
        f(&counters);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let lookups = self.lookups.load(Ordering::Relaxed);
        let micros_total = self.lookup_micros_total.load(Ordering::Relaxed);
        let avg_lookup_ms = if lookups == 0 {
            0.0
        } else {
            micros_total as f64 / lookups as f64 / 1000.0
        };

        let jobs = self
            .jobs
            .iter()
            .map(|entry| {
                let c = entry.value();
                (
                    entry.key().clone(),
                    JobSnapshot {
                        unused: c.unused.load(Ordering::Relaxed),
                        used: c.used.load(Ordering::Relaxed),
                        errors: c.errors.load(Ordering::Relaxed),
                        dropped_data_points: c.dropped_data_points.load(Ordering::Relaxed),
                    },
                )
            })
            .collect();

        StatsSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            lookups,
            lookup_errors: self.lookup_errors.load(Ordering::Relaxed),
            unused_verdicts: self.unused_verdicts.load(Ordering::Relaxed),
            used_verdicts: self.used_verdicts.load(Ordering::Relaxed),
            dropped_data_points: self.dropped_data_points.load(Ordering::Relaxed),
            dropped_metrics: self.dropped_metrics.load(Ordering::Relaxed),
            avg_lookup_ms,
            max_lookup_ms: self.lookup_micros_max.load(Ordering::Relaxed) as f64 / 1000.0,
            jobs,
        }
    }
}

impl PruneTelemetry for PruneStats {
    fn record_lookup(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.lookup_micros_total
            .fetch_add(micros, Ordering::Relaxed);
        self.lookup_micros_max.fetch_max(micros, Ordering::Relaxed);
    }

    fn record_lookup_error(&self, job: &str, _error: &OracleError) {
        self.lookup_errors.fetch_add(1, Ordering::Relaxed);
        self.with_job(job, |c| {
            c.errors.fetch_add(1, Ordering::Relaxed);
        });
    }

    fn record_unused(&self, job: &str) {
        self.unused_verdicts.fetch_add(1, Ordering::Relaxed);
        self.with_job(job, |c| {
            c.unused.fetch_add(1, Ordering::Relaxed);
        });
    }

    fn record_used(&self, job: &str) {
        self.used_verdicts.fetch_add(1, Ordering::Relaxed);
        self.with_job(job, |c| {
            c.used.fetch_add(1, Ordering::Relaxed);
        });
    }

    fn record_dropped_data_points(&self, job: &str, count: u64) {
        self.dropped_data_points.fetch_add(count, Ordering::Relaxed);
        self.with_job(job, |c| {
            c.dropped_data_points.fetch_add(count, Ordering::Relaxed);
        });
    }

    fn record_batch(&self, summary: &PruneSummary) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.dropped_metrics
            .fetch_add(summary.dropped_metrics as u64, Ordering::Relaxed);
    }
}

/// Per-job counters as served by the stats endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub unused: u64,
    pub used: u64,
    pub errors: u64,
    pub dropped_data_points: u64,
}

/// Point-in-time copy of [`PruneStats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub batches: u64,
    pub lookups: u64,
    pub lookup_errors: u64,
    pub unused_verdicts: u64,
    pub used_verdicts: u64,
    pub dropped_data_points: u64,
    pub dropped_metrics: u64,
    pub avg_lookup_ms: f64,
    pub max_lookup_ms: f64,
    pub jobs: BTreeMap<String, JobSnapshot>,
}
