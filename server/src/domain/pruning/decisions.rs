//! Per-batch memo of oracle verdicts

use std::collections::HashMap;
use std::time::Instant;

use super::telemetry::PruneTelemetry;
use crate::domain::usage::{UsageOracle, UsageQuery};

/// Drop decisions for one batch, keyed by `(job, metric name)`.
///
/// The oracle is consulted once per distinct key; errors resolve to "keep"
/// and are remembered like any other decision.
pub struct DecisionCache<'a> {
    oracle: &'a dyn UsageOracle,
    telemetry: &'a dyn PruneTelemetry,
    decisions: HashMap<UsageQuery, bool>,
}

impl<'a> DecisionCache<'a> {
    pub fn new(oracle: &'a dyn UsageOracle, telemetry: &'a dyn PruneTelemetry) -> Self {
        Self {
            oracle,
            telemetry,
            decisions: HashMap::new(),
        }
    }

    /// Whether data points matching `query` should be dropped
    pub async fn should_drop(&mut self, query: UsageQuery) -> bool {
        if let Some(&drop) = self.decisions.get(&query) {
            return drop;
        }

        let drop = self.ask_oracle(&query).await;
        self.decisions.insert(query, drop);
        drop
    }

    /// Number of distinct keys looked up so far
    pub fn lookups(&self) -> usize {
        self.decisions.len()
    }

    async fn ask_oracle(&self, query: &UsageQuery) -> bool {
        let started = Instant::now();
        let result = self.oracle.lookup(query).await;
        self.telemetry.record_lookup(started.elapsed());

        match result {
            Ok(verdict) if verdict.unused => {
                tracing::debug!(
                    job = %query.job,
                    metric = %query.metric_name,
                    "Metric is unused"
                );
                self.telemetry.record_unused(&query.job);
                true
            }
            Ok(_) => {
                self.telemetry.record_used(&query.job);
                false
            }
            Err(e) => {
                tracing::error!(
                    job = %query.job,
                    metric = %query.metric_name,
                    error = %e,
                    kind = e.kind(),
                    "Error getting metric usage, keeping data points"
                );
                self.telemetry.record_lookup_error(&query.job, &e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::domain::pruning::PruneStats;
    use crate::domain::usage::{OracleError, UsageVerdict};

    /// Oracle that reports every metric named `unused_*` as unused and fails
    /// for job `broken`
    #[derive(Default)]
    struct PrefixOracle {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UsageOracle for PrefixOracle {
        async fn lookup(&self, query: &UsageQuery) -> Result<UsageVerdict, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.job == "broken" {
                return Err(OracleError::Http { status: 503 });
            }
            Ok(UsageVerdict {
                name: query.metric_name.clone(),
                unused: query.metric_name.starts_with("unused_"),
                summary: None,
            })
        }
    }

    #[tokio::test]
    async fn test_unused_is_dropped() {
        let oracle = PrefixOracle::default();
        let stats = PruneStats::new();
        let mut cache = DecisionCache::new(&oracle, &stats);

        assert!(cache.should_drop(UsageQuery::new("api", "unused_total")).await);
        assert!(!cache.should_drop(UsageQuery::new("api", "requests_total")).await);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.unused_verdicts, 1);
        assert_eq!(snapshot.used_verdicts, 1);
        assert_eq!(snapshot.lookups, 2);
    }

    #[tokio::test]
    async fn test_repeated_key_hits_oracle_once() {
        let oracle = PrefixOracle::default();
        let stats = PruneStats::new();
        let mut cache = DecisionCache::new(&oracle, &stats);

        for _ in 0..10 {
            assert!(cache.should_drop(UsageQuery::new("api", "unused_total")).await);
        }

        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.lookups(), 1);
    }

    #[tokio::test]
    async fn test_distinct_jobs_are_distinct_keys() {
        let oracle = PrefixOracle::default();
        let stats = PruneStats::new();
        let mut cache = DecisionCache::new(&oracle, &stats);

        cache.should_drop(UsageQuery::new("a", "unused_total")).await;
        cache.should_drop(UsageQuery::new("b", "unused_total")).await;
        cache.should_drop(UsageQuery::new("", "unused_total")).await;

        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_error_fails_open_and_is_cached() {
        let oracle = PrefixOracle::default();
        let stats = PruneStats::new();
        let mut cache = DecisionCache::new(&oracle, &stats);

        assert!(!cache.should_drop(UsageQuery::new("broken", "unused_total")).await);
        assert!(!cache.should_drop(UsageQuery::new("broken", "unused_total")).await);

        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.lookup_errors, 1);
        assert_eq!(snapshot.jobs["broken"].errors, 1);
    }
}
