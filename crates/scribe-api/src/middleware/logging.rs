use axum::{extract::Request, http::header, middleware::Next, response::Response};
use std::time::Instant;

use crate::relay::SessionId;

/// Log every request once its response headers are ready
///
/// Streamed responses are logged at time to first byte; the relay logs its
/// own completion with the byte count under the same session id.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let request_bytes = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let start = Instant::now();

    let response = next.run(req).await;

    let session = response.extensions().get::<SessionId>().map(|id| id.0);
    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::warn!(
            %method,
            %path,
            status = status.as_u16(),
            latency_ms,
            ?request_bytes,
            "Request failed"
        );
    } else {
        tracing::info!(
            %method,
            %path,
            status = status.as_u16(),
            latency_ms,
            ?request_bytes,
            session = session.map(tracing::field::display),
            "Request served"
        );
    }

    response
}
