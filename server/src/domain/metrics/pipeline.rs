//! Metrics Processing Pipeline
//!
//! Prunes each batch in place, then hands what is left to the exporter.

use std::sync::Arc;

use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;

use crate::domain::forward::{ExportError, MetricsExporter};
use crate::domain::pruning::{MetricsPruner, PruneSummary};
use crate::utils::otlp::count_data_points;

/// Result of processing one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub summary: PruneSummary,
    /// Data points left after pruning
    pub remaining_data_points: usize,
    /// Whether the batch was sent downstream
    pub forwarded: bool,
}

pub struct MetricsPipeline {
    pruner: MetricsPruner,
    exporter: Option<Arc<dyn MetricsExporter>>,
}

impl MetricsPipeline {
    pub fn new(pruner: MetricsPruner, exporter: Option<Arc<dyn MetricsExporter>>) -> Self {
        Self { pruner, exporter }
    }

    /// Prune `request` and forward the survivors.
    ///
    /// Pruning never fails; only the downstream export can. An emptied batch is
    /// not forwarded.
    pub async fn process(
        &self,
        mut request: ExportMetricsServiceRequest,
    ) -> Result<PipelineOutcome, ExportError> {
        let received = count_data_points(&request);
        let summary = self.pruner.prune(&mut request).await;
        let remaining = count_data_points(&request);

        if summary.is_noop() {
            tracing::trace!(received, lookups = summary.lookups, "Nothing to prune");
        } else {
            tracing::debug!(
                received,
                remaining,
                dropped_data_points = summary.dropped_data_points,
                dropped_metrics = summary.dropped_metrics,
                dropped_resources = summary.dropped_resources,
                lookups = summary.lookups,
                "Pruned metrics batch"
            );
        }

        let forwarded = match &self.exporter {
            Some(exporter) if !request.resource_metrics.is_empty() => {
                exporter.export(&request).await.inspect_err(|e| {
                    tracing::warn!(error = %e, remaining, "Failed to forward metrics batch");
                })?;
                true
            }
            _ => false,
        };

        Ok(PipelineOutcome {
            summary,
            remaining_data_points: remaining,
            forwarded,
        })
    }
}
