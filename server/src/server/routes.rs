//! Router configuration for the booking server.

use super::health::{health_check, readiness_check, root};
use super::state::AppState;
use crate::api::{bookings, experts};
use crate::config::Config;
use crate::metrics::render_metrics;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header, request::Parts},
    routing::{get, patch},
};
use expert_booking_web::handlers::expert_rooms_socket;
use expert_booking_web::{CORRELATION_ID_HEADER, with_request_tracking};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the complete Axum router.
///
/// - `GET /`, `/health`, `/ready`, `/metrics`
/// - `GET /ws` expert room subscriptions
/// - `/api/experts` directory and `/api/bookings` reservations
pub fn build_router(state: AppState, config: &Config) -> Router {
    let api_routes = Router::new()
        .route("/experts", get(experts::list_experts))
        .route("/experts/categories", get(experts::list_categories))
        .route("/experts/:id", get(experts::get_expert))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/:id/status", patch(bookings::update_booking_status));

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(render_metrics))
        .route("/ws", get(expert_rooms_socket))
        .nest("/api", api_routes)
        .with_state(state);

    with_request_tracking(router).layer(cors_layer(config))
}

/// CORS policy.
///
/// Outside production any local development origin is accepted in addition
/// to the configured list.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let allowed: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let allow_local = !config.is_production();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                (allow_local && is_local_origin(origin)) || allowed.contains(origin)
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(CORRELATION_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(CORRELATION_ID_HEADER)])
        .allow_credentials(true)
}

fn is_local_origin(origin: &HeaderValue) -> bool {
    origin.to_str().is_ok_and(|origin| {
        origin.starts_with("http://localhost:") || origin.starts_with("http://127.0.0.1:")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_origins() {
        assert!(is_local_origin(&HeaderValue::from_static("http://localhost:3000")));
        assert!(is_local_origin(&HeaderValue::from_static("http://127.0.0.1:5173")));
        assert!(!is_local_origin(&HeaderValue::from_static("https://evil.example")));
        assert!(!is_local_origin(&HeaderValue::from_static("http://localhost.evil.example")));
    }
}
