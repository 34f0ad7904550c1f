//! Logging middleware
//!
//! Logs every request with its response status and latency.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};
use std::time::Instant;

/// Log a request once its response is ready
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        warn!("{} {} -> {} ({} ms)", method, uri, status.as_u16(), elapsed_ms);
    } else {
        info!("{} {} -> {} ({} ms)", method, uri, status.as_u16(), elapsed_ms);
    }

    response
}
