//! HTTP middleware (404 handler)

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::IntoResponse;

const MAX_404_BODY_LOG: usize = 4 * 1024;

/// Handle 404 Not Found with logging
///
/// Misrouted OTLP senders (wrong path prefix, traces/logs endpoints) are the
/// usual cause, so method, path and content type are logged at debug.
pub async fn handle_404(req: Request) -> impl IntoResponse {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return StatusCode::NOT_FOUND;
    }

    let method = req.method().clone();
    let uri = req.uri().clone();
    let content_type = req
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body_len = match to_bytes(req.into_body(), MAX_404_BODY_LOG).await {
        Ok(bytes) => bytes.len().to_string(),
        Err(_) => format!(">{}", MAX_404_BODY_LOG),
    };

    tracing::debug!(
        %method,
        %uri,
        content_type,
        body_bytes = body_len,
        "[404] No route"
    );

    StatusCode::NOT_FOUND
}
