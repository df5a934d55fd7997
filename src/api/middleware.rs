//! API Middleware
//!
//! Request logging with per-request correlation ids.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Correlation id for a request: honors a valid X-Correlation-Id header,
/// otherwise generates a fresh one.
fn correlation_id_from(headers: &HeaderMap) -> Uuid {
    headers
        .get("X-Correlation-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4)
}

/// Request logging middleware
///
/// Tags both log lines of a request with its correlation id.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let correlation_id = correlation_id_from(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = %correlation_id,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        correlation_id = %correlation_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_honors_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert("X-Correlation-Id", id.to_string().parse().unwrap());

        assert_eq!(correlation_id_from(&headers), id);
    }

    #[test]
    fn test_correlation_id_generated_when_missing_or_invalid() {
        let headers = HeaderMap::new();
        let generated = correlation_id_from(&headers);
        assert_ne!(generated, Uuid::nil());

        let mut headers = HeaderMap::new();
        headers.insert("X-Correlation-Id", "not-a-uuid".parse().unwrap());
        let generated = correlation_id_from(&headers);
        assert_ne!(generated, Uuid::nil());
    }
}
