//! Application state for the booking HTTP server.

use crate::app::Storage;
use axum::extract::FromRef;
use expert_booking_core::{ExpertDirectory, ReservationCoordinator};
use expert_booking_web::RealtimeState;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Writes bookings and slots
    pub coordinator: ReservationCoordinator,
    /// Read side for the expert endpoints
    pub directory: Arc<dyn ExpertDirectory>,
    /// Backend probed by readiness checks
    pub storage: Storage,
    /// Topic registry and socket settings
    pub realtime: RealtimeState,
    /// Prometheus handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

// Lets the WebSocket handler extract its own slice of the state
impl FromRef<AppState> for RealtimeState {
    fn from_ref(state: &AppState) -> Self {
        state.realtime.clone()
    }
}
