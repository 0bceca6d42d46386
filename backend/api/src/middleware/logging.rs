//! Per-request access logging.
use axum::{extract::Request, middleware::Next, response::Response};
use tokio::time::Instant;
use tracing::info;

/// Log the method, path, status and latency of every request.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();
    let response = next.run(req).await;
    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis(),
        "Handled request"
    );
    response
}
