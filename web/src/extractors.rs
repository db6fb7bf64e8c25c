//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation ID (set by
//!   [`with_request_tracking`](crate::middleware::with_request_tracking) or
//!   generated on the spot)
//! - `ApiJson`: JSON body extractor whose rejections render as [`AppError`]
//!
//! ```ignore
//! async fn create_booking(
//!     State(state): State<AppState>,
//!     correlation_id: CorrelationId,
//!     ApiJson(body): ApiJson<CreateBookingRequest>,
//! ) -> Result<(StatusCode, Json<ApiResponse<Booking>>), AppError> {
//!     debug!(correlation_id = %correlation_id.0, "Creating booking");
//!     // ...
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Correlation ID extractor.
///
/// Reads the `X-Correlation-ID` header; a missing or non-UUID value yields a
/// fresh ID.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let supplied = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.parse::<Uuid>().ok());
        Ok(Self(supplied.unwrap_or_else(Uuid::new_v4)))
    }
}

/// JSON body extractor with API-shaped rejections.
///
/// Malformed JSON, a wrong content type or a body missing required fields
/// is rejected with `400 VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> AppError {
    let message = match rejection {
        JsonRejection::JsonDataError(_) => "Please provide all required fields",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        _ => "Invalid request body",
    };
    tracing::debug!(error = %rejection.body_text(), "Rejected request body");
    AppError::validation(message)
        .with_details(serde_json::json!({ "reason": rejection.body_text() }))
}
