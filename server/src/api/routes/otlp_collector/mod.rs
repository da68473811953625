//! OpenTelemetry Protocol (OTLP) HTTP and gRPC metrics endpoints

mod encoding;
mod grpc;
mod metrics;

pub use grpc::OtlpGrpcServer;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;

use crate::domain::MetricsPipeline;

#[derive(Clone)]
pub struct OtlpState {
    pub pipeline: Arc<MetricsPipeline>,
}

/// OTLP/HTTP routes, nested under `/v1`
pub fn routes(pipeline: Arc<MetricsPipeline>) -> Router {
    Router::new()
        .route("/metrics", post(metrics::export))
        .with_state(OtlpState { pipeline })
}
