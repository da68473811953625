//! OTLP content-type encoding and decoding
//!
//! Requests and responses use protobuf (`application/x-protobuf`) or JSON
//! (`application/json`); the response mirrors the request encoding.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use prost::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::constants::BACKPRESSURE_RETRY_AFTER_SECS;
use crate::domain::forward::ExportError;

/// Content type for OTLP requests/responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtlpContentType {
    Protobuf,
    Json,
}

impl OtlpContentType {
    /// Missing or unrecognized content types are treated as protobuf
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if content_type.starts_with("application/json") {
            OtlpContentType::Json
        } else {
            OtlpContentType::Protobuf
        }
    }

    pub fn as_header_value(self) -> &'static str {
        match self {
            OtlpContentType::Protobuf => "application/x-protobuf",
            OtlpContentType::Json => "application/json",
        }
    }

    fn decode_error_message(self) -> &'static str {
        match self {
            OtlpContentType::Protobuf => "Failed to decode protobuf request",
            OtlpContentType::Json => "Failed to decode JSON request",
        }
    }
}

/// Error returned when decoding fails
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("protobuf decode error: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    /// 400 response for a decode failure. Details are logged, not returned.
    pub fn into_response(self, content_type: OtlpContentType) -> Response {
        tracing::warn!(
            error = %self,
            content_type = content_type.as_header_value(),
            "Failed to decode OTLP request"
        );

        (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "text/plain")],
            content_type.decode_error_message(),
        )
            .into_response()
    }
}

/// Decode an OTLP request from bytes based on content type
pub fn decode_request<T>(body: &Bytes, content_type: OtlpContentType) -> Result<T, DecodeError>
where
    T: Message + Default + for<'de> Deserialize<'de>,
{
    match content_type {
        OtlpContentType::Protobuf => Ok(T::decode(body.as_ref())?),
        OtlpContentType::Json => Ok(serde_json::from_slice(body.as_ref())?),
    }
}

/// Successful OTLP response in the request's encoding
pub fn success_response<T>(response: &T, content_type: OtlpContentType) -> Response
where
    T: Message + Serialize,
{
    let encoded = match content_type {
        OtlpContentType::Protobuf => Ok(response.encode_to_vec()),
        OtlpContentType::Json => serde_json::to_vec(response),
    };

    match encoded {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type.as_header_value())],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode OTLP response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "Internal server error",
            )
                .into_response()
        }
    }
}

/// Response for a batch that could not be forwarded downstream.
///
/// Retryable failures answer 503 with `retry-after` so OTLP senders back off
/// and resend; anything else is a 502.
pub fn export_failure_response(error: &ExportError) -> Response {
    if error.is_retryable() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            [(
                HeaderName::from_static("retry-after"),
                BACKPRESSURE_RETRY_AFTER_SECS.to_string(),
            )],
        )
            .into_response()
    } else {
        (
            StatusCode::BAD_GATEWAY,
            [(header::CONTENT_TYPE, "text/plain")],
            "Failed to forward metrics",
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_proto::tonic::collector::metrics::v1::{
        ExportMetricsServiceRequest, ExportMetricsServiceResponse,
    };
    use opentelemetry_proto::tonic::metrics::v1::{Metric, ResourceMetrics, ScopeMetrics};

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, content_type.parse().unwrap());
        headers
    }

    #[test]
    fn test_content_type_from_headers() {
        assert_eq!(
            OtlpContentType::from_headers(&headers_with("application/x-protobuf")),
            OtlpContentType::Protobuf
        );
        assert_eq!(
            OtlpContentType::from_headers(&headers_with("application/json; charset=utf-8")),
            OtlpContentType::Json
        );
        assert_eq!(
            OtlpContentType::from_headers(&headers_with("text/plain")),
            OtlpContentType::Protobuf
        );
        assert_eq!(
            OtlpContentType::from_headers(&HeaderMap::new()),
            OtlpContentType::Protobuf
        );
    }

    #[test]
    fn test_decode_protobuf_metrics() {
        let request = ExportMetricsServiceRequest {
            resource_metrics: vec![ResourceMetrics {
                scope_metrics: vec![ScopeMetrics {
                    metrics: vec![Metric {
                        name: "http_requests_total".to_string(),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };
        let bytes = Bytes::from(request.encode_to_vec());

        let decoded: ExportMetricsServiceRequest =
            decode_request(&bytes, OtlpContentType::Protobuf).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_decode_json_metrics() {
        let json = r#"{
            "resourceMetrics": [{
                "scopeMetrics": [{
                    "metrics": [{
                        "name": "up",
                        "gauge": { "dataPoints": [{
                            "attributes": [{ "key": "job", "value": { "stringValue": "node" } }],
                            "asDouble": 1.0
                        }] }
                    }]
                }]
            }]
        }"#;
        let decoded: ExportMetricsServiceRequest =
            decode_request(&Bytes::from(json), OtlpContentType::Json).unwrap();
        let metric = &decoded.resource_metrics[0].scope_metrics[0].metrics[0];
        assert_eq!(metric.name, "up");
        assert!(metric.data.is_some());
    }

    #[test]
    fn test_decode_empty_body() {
        let decoded: ExportMetricsServiceRequest =
            decode_request(&Bytes::new(), OtlpContentType::Protobuf).unwrap();
        assert!(decoded.resource_metrics.is_empty());

        let result: Result<ExportMetricsServiceRequest, _> =
            decode_request(&Bytes::new(), OtlpContentType::Json);
        assert!(matches!(result, Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_invalid_protobuf() {
        let result: Result<ExportMetricsServiceRequest, _> =
            decode_request(&Bytes::from_static(&[0xff, 0xff, 0xff]), OtlpContentType::Protobuf);
        assert!(matches!(result, Err(DecodeError::Protobuf(_))));
    }

    #[test]
    fn test_success_response_json() {
        let response = success_response(
            &ExportMetricsServiceResponse {
                partial_success: None,
            },
            OtlpContentType::Json,
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[test]
    fn test_export_failure_response() {
        let response = export_failure_response(&ExportError::Http { status: 503 });
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()["retry-after"], "1");

        let response = export_failure_response(&ExportError::Http { status: 400 });
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
