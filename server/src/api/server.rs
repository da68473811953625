//! API server initialization

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;

use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware;
use super::routes::{health, otlp_collector, stats};
use crate::core::CoreApp;
use crate::core::constants::OTLP_BODY_LIMIT;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Build the HTTP router: OTLP ingestion plus health and stats
    pub fn router(app: &CoreApp) -> Router {
        let otlp_routes = otlp_collector::routes(app.pipeline.clone())
            .layer(DefaultBodyLimit::max(OTLP_BODY_LIMIT));

        Router::new()
            .route("/api/v1/health", get(health::health))
            .nest("/api/v1/stats", stats::routes(app.stats.clone()))
            .nest("/v1", otlp_routes)
            .fallback(middleware::handle_404)
            .layer(CompressionLayer::new())
            .layer(TraceLayer::new_for_http())
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);
        let router = Self::router(&app);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "OTLP/HTTP receiver listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use httpmock::prelude::*;
    use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
    use opentelemetry_proto::tonic::metrics::v1::{
        Gauge, Metric, NumberDataPoint, ResourceMetrics, ScopeMetrics, metric::Data,
    };
    use prost::Message;
    use tower::ServiceExt;

    use crate::core::config::{AppConfig, OtelConfig, ServerConfig, UsageConfig};
    use crate::utils::otlp::string_attr;

    fn app(usage_address: String) -> CoreApp {
        CoreApp::from_config(AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 4318,
            },
            otel: OtelConfig {
                grpc_enabled: false,
                grpc_port: 4317,
            },
            usage: UsageConfig {
                address: usage_address,
                timeout_ms: 1_000,
                insecure_skip_verify: false,
            },
            exporter: None,
        })
        .unwrap()
    }

    fn gauge(name: &str) -> Metric {
        Metric {
            name: name.to_string(),
            data: Some(Data::Gauge(Gauge {
                data_points: vec![NumberDataPoint {
                    attributes: vec![string_attr("job", "node")],
                    ..Default::default()
                }],
            })),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let router = ApiServer::router(&app("http://127.0.0.1:1".to_string()));
        let response = router
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let router = ApiServer::router(&app("http://127.0.0.1:1".to_string()));
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/traces")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ingest_then_stats() {
        let oracle = MockServer::start_async().await;
        oracle
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/metrics/unused")
                    .query_param("job", "node")
                    .query_param("name", "node_debug_info");
                then.status(200).json_body(serde_json::json!({
                    "data": [{ "name": "node_debug_info", "unused": true }]
                }));
            })
            .await;
        oracle
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/metrics/unused")
                    .query_param("name", "node_load1");
                then.status(200).json_body(serde_json::json!({ "data": [] }));
            })
            .await;

        let app = app(oracle.base_url());
        let stats = app.stats.clone();
        let router = ApiServer::router(&app);

        let request = ExportMetricsServiceRequest {
            resource_metrics: vec![ResourceMetrics {
                scope_metrics: vec![ScopeMetrics {
                    metrics: vec![gauge("node_debug_info"), gauge("node_load1")],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/metrics")
                    .header(header::CONTENT_TYPE, "application/x-protobuf")
                    .body(Body::from(request.encode_to_vec()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.batches, 1);
        assert_eq!(snapshot.dropped_data_points, 1);

        let response = router
            .oneshot(Request::builder().uri("/api/v1/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["jobs"]["node"]["unused"], 1);
        assert_eq!(json["jobs"]["node"]["used"], 1);
    }
}
