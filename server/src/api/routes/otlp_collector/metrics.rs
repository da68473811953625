//! Metrics export endpoint

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use opentelemetry_proto::tonic::collector::metrics::v1::{
    ExportMetricsServiceRequest, ExportMetricsServiceResponse,
};

use super::OtlpState;
use super::encoding::{
    OtlpContentType, decode_request, export_failure_response, success_response,
};

pub async fn export(State(state): State<OtlpState>, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = OtlpContentType::from_headers(&headers);

    let request: ExportMetricsServiceRequest = match decode_request(&body, content_type) {
        Ok(req) => req,
        Err(e) => return e.into_response(content_type),
    };

    if let Err(e) = state.pipeline.process(request).await {
        return export_failure_response(&e);
    }

    let response = ExportMetricsServiceResponse {
        partial_success: None,
    };
    success_response(&response, content_type)
}
