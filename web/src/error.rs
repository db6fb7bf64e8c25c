//! HTTP rendering of booking failures.
//!
//! Every error leaves as `{"success": false, "code": .., "message": .., "details"?: ..}`.
//! The status is derived from the [`ErrorCode`], so the two never disagree.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use expert_booking_core::BookingError;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// Machine-readable codes sent to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request
    BadRequest,
    /// Missing or malformed fields
    ValidationError,
    /// Unknown expert or booking
    NotFound,
    /// Slot already held
    Conflict,
    /// Storage or transport failure
    InternalServerError,
    /// Temporarily unable to serve
    ServiceUnavailable,
}

impl ErrorCode {
    /// HTTP status for this code
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::BadRequest | Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Wire name of the code
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every handler.
///
/// ```ignore
/// async fn cancel(State(state): State<AppState>, Path(id): Path<BookingId>) -> Result<Json<Booking>, AppError> {
///     Ok(Json(state.coordinator.set_status(id, BookingStatus::Cancelled).await?))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
    // Logged for 5xx, never rendered
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Error with a code and a client-facing message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach the underlying failure for the logs.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach client-visible detail.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// Machine-readable code
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Client-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `400 BAD_REQUEST`
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// `400 VALIDATION_ERROR`
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// `404 NOT_FOUND` with the message "{resource} not found".
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::new(ErrorCode::NotFound, format!("{resource} not found"))
    }

    /// `409 CONFLICT`
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// `500 INTERNAL_SERVER_ERROR`
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    /// `503 SERVICE_UNAVAILABLE`
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let cause = self
                .source
                .as_ref()
                .map_or_else(String::new, |source| format!("{source:#}"));
            tracing::error!(code = %self.code, message = %self.message, %cause, "Request failed");
        }

        let body = ErrorBody {
            success: false,
            code: self.code,
            message: &self.message,
            details: self.details.as_ref(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation { message, fields } => {
                Self::validation(message).with_details(json!({ "fields": fields }))
            }
            BookingError::NotFound { resource, .. } => Self::not_found(resource),
            BookingError::Conflict(message) => Self::conflict(message),
            BookingError::Unexpected(detail) => Self::internal("An internal error occurred")
                .with_source(anyhow::anyhow!(detail)),
        }
    }
}
