//! Request tracking middleware.
//!
//! [`with_request_tracking`] wraps a router with:
//! - **Correlation ID**: taken from `X-Correlation-ID` or generated as a UUID
//! - **Tracing span**: `http_request` with the correlation ID, method and URI
//! - **Response header**: the correlation ID is echoed back
//!
//! # Flow
//!
//! ```text
//! SetRequestId ─> TraceLayer (http_request span) ─> handler ─> PropagateRequestId
//! ```

use axum::{Router, body::Body, http::HeaderName, http::Request};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

fn correlation_header() -> HeaderName {
    HeaderName::from_static(CORRELATION_ID_HEADER)
}

/// Span for one HTTP request.
fn request_span(request: &Request<Body>) -> Span {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}

/// Add correlation ID and tracing layers to a router.
///
/// # Example
///
/// ```ignore
/// let app = with_request_tracking(Router::new().route("/api/experts", get(list_experts)));
/// ```
pub fn with_request_tracking<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(PropagateRequestIdLayer::new(correlation_header()))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::new(correlation_header(), MakeRequestUuid))
}
