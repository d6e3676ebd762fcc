//! Request tracing middleware

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::rate_limiter::extract_client_ip;

static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Log each request with timing and tag the response with a request id
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_ip = extract_client_ip(&request);

    let request_id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!("request", %request_id, %method, %path);

    async move {
        let start = Instant::now();
        tracing::debug!(client_ip = %client_ip, "Request started");

        let mut response = next.run(request).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), duration_ms, "Request completed with error");
        } else if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), duration_ms, "Request completed with client error");
        } else {
            tracing::info!(status = status.as_u16(), duration_ms, "Request completed");
        }

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID.clone(), value);
        }

        response
    }
    .instrument(span)
    .await
}
