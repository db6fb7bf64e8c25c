//! Prometheus metrics for the booking server.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `booking_reservations_total{outcome}` - Reservation attempts by outcome
//! - `booking_status_updates_total{status}` - Applied status transitions
//! - `booking_calendar_drift_total{operation}` - Calendar writes that missed or failed
//! - `booking_slot_events_total{event}` - Slot events published to rooms
//! - `booking_realtime_dropped_subscribers_total` - Subscribers dropped for a full or closed queue
//!
//! ## Gauges
//! - `booking_realtime_connections` - Open WebSocket connections

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use expert_booking_web::AppError;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

use crate::server::state::AppState;

/// Metrics setup errors
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install the global recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Register descriptions for every booking metric.
///
/// This should be called once at startup, after the recorder is installed.
pub fn register_booking_metrics() {
    describe_counter!(
        "booking_reservations_total",
        "Reservation attempts by outcome (created, conflict, not_found, invalid, error)"
    );
    describe_counter!(
        "booking_status_updates_total",
        "Booking status transitions by target status"
    );
    describe_counter!(
        "booking_calendar_drift_total",
        "Calendar updates that found no slot or failed after the ledger committed"
    );
    describe_counter!(
        "booking_slot_events_total",
        "Slot change events published to expert rooms"
    );
    describe_counter!(
        "booking_realtime_dropped_subscribers_total",
        "Subscribers removed because their queue was full or closed"
    );
    describe_gauge!(
        "booking_realtime_connections",
        "Currently open WebSocket connections"
    );

    tracing::info!("Booking metrics registered");
}

/// Install the Prometheus recorder and register descriptions.
///
/// # Errors
///
/// Returns [`MetricsError::Install`] if a global recorder is already set.
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;
    register_booking_metrics();
    Ok(handle)
}

/// `GET /metrics` in the Prometheus text format.
#[allow(clippy::unused_async)] // Axum handler signature requires async
pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => AppError::unavailable("Metrics recorder not installed").into_response(),
    }
}
