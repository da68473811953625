//! Downstream OTLP/HTTP forwarding of pruned batches

mod error;
mod exporter;

pub use error::ExportError;
pub use exporter::{ExporterConfig, MetricsExporter, OtlpHttpExporter};
