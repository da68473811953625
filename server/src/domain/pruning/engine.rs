//! Pruning engine

use std::sync::Arc;

use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use opentelemetry_proto::tonic::metrics::v1::{Metric, ResourceMetrics, ScopeMetrics};

use super::decisions::DecisionCache;
use super::job::resolve_job;
use super::points::MetricPoints;
use super::telemetry::PruneTelemetry;
use crate::domain::usage::{UsageOracle, UsageQuery};

/// What a single `prune` call removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub dropped_data_points: usize,
    pub dropped_metrics: usize,
    pub dropped_scopes: usize,
    pub dropped_resources: usize,
    /// Distinct `(job, metric)` pairs sent to the oracle
    pub lookups: usize,
}

impl PruneSummary {
    pub fn is_noop(&self) -> bool {
        self.dropped_data_points == 0 && self.dropped_metrics == 0
    }
}

/// Removes data points the usage oracle reports as unused.
///
/// Holds no per-batch state; one instance can serve concurrent batches.
#[derive(Clone)]
pub struct MetricsPruner {
    oracle: Arc<dyn UsageOracle>,
    telemetry: Arc<dyn PruneTelemetry>,
}

impl MetricsPruner {
    pub fn new(oracle: Arc<dyn UsageOracle>, telemetry: Arc<dyn PruneTelemetry>) -> Self {
        Self { oracle, telemetry }
    }

    /// Prune `request` in place.
    ///
    /// Every level (data points, metrics, scopes, resources) is filtered left
    /// to right, so survivors keep their relative order. Containers emptied by
    /// pruning are removed; a metric without a data oneof is left as is.
    pub async fn prune(&self, request: &mut ExportMetricsServiceRequest) -> PruneSummary {
        let mut cache = DecisionCache::new(self.oracle.as_ref(), self.telemetry.as_ref());
        let mut summary = PruneSummary::default();

        let resources = std::mem::take(&mut request.resource_metrics);
        for mut resource in resources {
            self.prune_resource(&mut resource, &mut cache, &mut summary)
                .await;
            if resource.scope_metrics.is_empty() {
                summary.dropped_resources += 1;
            } else {
                request.resource_metrics.push(resource);
            }
        }

        summary.lookups = cache.lookups();
        self.telemetry.record_batch(&summary);
        summary
    }

    async fn prune_resource(
        &self,
        resource: &mut ResourceMetrics,
        cache: &mut DecisionCache<'_>,
        summary: &mut PruneSummary,
    ) {
        let scopes = std::mem::take(&mut resource.scope_metrics);
        for mut scope in scopes {
            self.prune_scope(&mut scope, cache, summary).await;
            if scope.metrics.is_empty() {
                summary.dropped_scopes += 1;
            } else {
                resource.scope_metrics.push(scope);
            }
        }
    }

    async fn prune_scope(
        &self,
        scope: &mut ScopeMetrics,
        cache: &mut DecisionCache<'_>,
        summary: &mut PruneSummary,
    ) {
        let metrics = std::mem::take(&mut scope.metrics);
        for mut metric in metrics {
            if self.prune_metric(&mut metric, cache, summary).await {
                scope.metrics.push(metric);
            } else {
                summary.dropped_metrics += 1;
            }
        }
    }

    /// Drop unused data points of one metric. Returns whether the metric
    /// should be kept.
    async fn prune_metric(
        &self,
        metric: &mut Metric,
        cache: &mut DecisionCache<'_>,
        summary: &mut PruneSummary,
    ) -> bool {
        let Some(data) = metric.data.as_mut() else {
            return true;
        };
        let mut points = MetricPoints::new(data);

        let jobs: Vec<String> = points
            .attributes()
            .into_iter()
            .map(resolve_job)
            .collect();

        let mut keep = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let query = UsageQuery::new(job.as_str(), metric.name.as_str());
            keep.push(!cache.should_drop(query).await);
        }

        let removed = points.retain_marked(&keep);
        if removed > 0 {
            summary.dropped_data_points += removed;
            for (job, dropped) in count_dropped_by_job(&jobs, &keep) {
                self.telemetry
                    .record_dropped_data_points(job, dropped as u64);
            }
            tracing::trace!(
                metric = %metric.name,
                kind = points.kind(),
                removed,
                remaining = points.len(),
                "Pruned data points"
            );
        }

        !points.is_empty()
    }
}

/// Dropped data point counts per job, in first-seen order
fn count_dropped_by_job<'j>(jobs: &'j [String], keep: &[bool]) -> Vec<(&'j str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for (job, _) in jobs.iter().zip(keep).filter(|(_, kept)| !**kept) {
        match counts.iter_mut().find(|(j, _)| *j == job.as_str()) {
            Some((_, n)) => *n += 1,
            None => counts.push((job.as_str(), 1)),
        }
    }
    counts
}
