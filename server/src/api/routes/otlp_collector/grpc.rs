//! gRPC OTLP server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tonic::transport::Server as TonicServer;
use tonic::{Request, Response, Status};

use opentelemetry_proto::tonic::collector::metrics::v1::{
    ExportMetricsServiceRequest, ExportMetricsServiceResponse,
    metrics_service_server::{MetricsService, MetricsServiceServer},
};

use crate::core::config::OtelConfig;
use crate::core::constants::OTLP_BODY_LIMIT;
use crate::domain::MetricsPipeline;
use crate::domain::forward::ExportError;

pub struct OtlpGrpcServer {
    addr: SocketAddr,
    pipeline: Arc<MetricsPipeline>,
}

impl OtlpGrpcServer {
    pub fn new(config: &OtelConfig, host: &str, pipeline: Arc<MetricsPipeline>) -> Result<Self> {
        let addr = SocketAddr::new(host.parse()?, config.grpc_port);
        Ok(Self { addr, pipeline })
    }

    pub async fn start(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let addr = self.addr;

        tracing::debug!(%addr, "Starting OTLP gRPC server");

        TonicServer::builder()
            .add_service(
                MetricsServiceServer::new(OtlpMetricsService {
                    pipeline: self.pipeline,
                })
                .max_decoding_message_size(OTLP_BODY_LIMIT)
                .max_encoding_message_size(OTLP_BODY_LIMIT),
            )
            .serve_with_shutdown(addr, async move {
                let _ = shutdown_rx.wait_for(|&v| v).await;
                tracing::debug!("OTLP gRPC server shutting down");
            })
            .await?;

        Ok(())
    }
}

/// gRPC metrics service
struct OtlpMetricsService {
    pipeline: Arc<MetricsPipeline>,
}

#[tonic::async_trait]
impl MetricsService for OtlpMetricsService {
    async fn export(
        &self,
        request: Request<ExportMetricsServiceRequest>,
    ) -> Result<Response<ExportMetricsServiceResponse>, Status> {
        self.pipeline
            .process(request.into_inner())
            .await
            .map_err(|e| export_status(&e))?;

        Ok(Response::new(ExportMetricsServiceResponse {
            partial_success: None,
        }))
    }
}

/// gRPC status for a failed downstream export. `UNAVAILABLE` tells OTLP
/// clients to retry.
fn export_status(error: &ExportError) -> Status {
    if error.is_retryable() {
        Status::unavailable("downstream export failed")
    } else {
        Status::internal("downstream export rejected the batch")
    }
}
