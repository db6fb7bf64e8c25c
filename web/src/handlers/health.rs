//! Health check endpoints.
//!
//! Liveness (`/health`) always answers while the process runs; readiness
//! reports individual dependency checks and answers `503` if any failed.

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde::Serialize;

/// Outcome of a single dependency probe.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CheckResult {
    /// Dependency name
    pub name: String,
    /// `"ok"` or `"error"`
    pub status: &'static str,
    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate health report.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    /// `"ok"` or `"degraded"`
    pub status: &'static str,
    /// Individual checks
    pub checks: Vec<CheckResult>,
}

impl HealthReport {
    /// Empty, healthy report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: "ok",
            checks: Vec::new(),
        }
    }

    /// Record the result of a probe.
    #[must_use]
    pub fn check<E: std::fmt::Display>(mut self, name: &str, result: Result<(), E>) -> Self {
        let check = match result {
            Ok(()) => CheckResult {
                name: name.to_string(),
                status: "ok",
                message: None,
            },
            Err(e) => {
                tracing::warn!(check = name, error = %e, "Readiness check failed");
                self.status = "degraded";
                CheckResult {
                    name: name.to_string(),
                    status: "error",
                    message: Some(e.to_string()),
                }
            }
        };
        self.checks.push(check);
        self
    }

    /// Whether every check passed
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.checks.iter().all(|check| check.status == "ok")
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        let status = if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(self)).into_response()
    }
}

/// Liveness probe.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[test]
    fn test_failed_check_degrades_report() {
        let report = HealthReport::new()
            .check::<String>("rooms", Ok(()))
            .check("database", Err("connection refused"));

        assert!(!report.is_healthy());
        assert_eq!(report.status, "degraded");
        assert_eq!(report.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
