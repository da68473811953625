//! Metrics Processing Pipeline
//!
//! Prunes incoming OTLP metrics batches and forwards the survivors downstream.

mod pipeline;

pub use pipeline::{MetricsPipeline, PipelineOutcome};
