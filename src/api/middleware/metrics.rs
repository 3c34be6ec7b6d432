use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;

use super::request_id::REQUEST_ID_HEADER;

/// Logs one line per request once the response head is ready.
///
/// For streamed downloads the latency covers time to first byte, not the transfer.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status();

    info!(
        target: "metrics",
        method = %method,
        uri = %uri,
        request_id = %request_id,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "request_completed"
    );

    response
}
