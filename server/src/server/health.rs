//! Health check endpoints for the booking server.

use super::state::AppState;
use axum::extract::State;
use expert_booking_web::handlers::HealthReport;

pub use expert_booking_web::handlers::health_check;

/// Readiness check endpoint.
///
/// Returns `200` when the storage backend answers, `503` otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:5000/ready
/// # {"status":"ok","checks":[{"name":"storage","status":"ok"}]}
/// ```
pub async fn readiness_check(State(state): State<AppState>) -> HealthReport {
    state.storage.readiness().await
}

/// Root banner.
#[allow(clippy::unused_async)] // Axum handler signature requires async
pub async fn root() -> &'static str {
    "API is running..."
}
