//! Booking API endpoints.
//!
//! - POST /api/bookings - Reserve a slot
//! - GET /api/bookings?email= - A customer's bookings, newest first
//! - PATCH /api/bookings/:id/status - Move a booking to a new status

use super::ApiResponse;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, NaiveTime};
use expert_booking_core::{
    Booking, BookingId, BookingStatus, Customer, CustomerBooking, ExpertId, FieldError,
    ReservationRequest, TimeRange,
};
use expert_booking_web::{ApiJson, AppError, CorrelationId};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::LazyLock;
use tracing::debug;

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /api/bookings`.
///
/// Every field defaults to empty so missing values surface as field errors
/// rather than deserialization failures.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Expert ID
    pub expert: String,
    /// Customer name
    pub name: String,
    /// Customer email
    pub email: String,
    /// Customer phone
    pub phone: String,
    /// Slot date (`YYYY-MM-DD`)
    pub date: String,
    /// Slot bounds
    pub time_slot: TimeSlotBody,
    /// Free-form notes
    pub notes: String,
}

/// `{startTime, endTime}` as sent by clients.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeSlotBody {
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
}

/// Query of `GET /api/bookings`.
#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    /// Customer email, matched case-insensitively
    pub email: Option<String>,
}

/// Body of `PATCH /api/bookings/:id/status`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStatusRequest {
    /// One of `Pending`, `Confirmed`, `Completed`, `Cancelled`
    pub status: String,
}

// ============================================================================
// Validation
// ============================================================================

impl CreateBookingRequest {
    /// Required fields that are blank.
    fn missing_fields(&self) -> Vec<FieldError> {
        [
            ("expert", &self.expert),
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("date", &self.date),
            ("timeSlot.startTime", &self.time_slot.start_time),
            ("timeSlot.endTime", &self.time_slot.end_time),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| FieldError::new(field, format!("{field} is required")))
        .collect()
    }

    /// Present fields with the wrong shape.
    fn format_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !is_email_shaped(self.email.trim()) {
            errors.push(FieldError::new("email", "Please provide a valid email address"));
        }
        if NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").is_err() {
            errors.push(FieldError::new("date", "Date must be YYYY-MM-DD"));
        }
        for (field, value) in [
            ("timeSlot.startTime", &self.time_slot.start_time),
            ("timeSlot.endTime", &self.time_slot.end_time),
        ] {
            if NaiveTime::parse_from_str(value.trim(), "%H:%M").is_err() {
                errors.push(FieldError::new(field, "Time must be HH:MM"));
            }
        }
        errors
    }

    fn validate(&self) -> Result<(), AppError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::validation("All fields are required")
                .with_details(json!({ "fields": missing })));
        }
        let malformed = self.format_errors();
        if !malformed.is_empty() {
            return Err(AppError::validation("Invalid booking details")
                .with_details(json!({ "fields": malformed })));
        }
        Ok(())
    }

    fn into_reservation(self, expert_id: ExpertId) -> ReservationRequest {
        ReservationRequest {
            expert_id,
            date: self.date.trim().to_string(),
            time_slot: TimeRange::new(
                self.time_slot.start_time.trim(),
                self.time_slot.end_time.trim(),
            ),
            customer: Customer::new(&self.name, &self.email, &self.phone),
            notes: self.notes.trim().to_string(),
        }
    }
}

#[allow(clippy::expect_used)] // Literal pattern
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"));

/// Something that looks like `local@domain.tld`, without whitespace.
fn is_email_shaped(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

// ============================================================================
// Handlers
// ============================================================================

/// Reserve a slot.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/bookings \
///   -H "Content-Type: application/json" \
///   -d '{
///     "expert": "6f1c...",
///     "name": "Ada Lovelace",
///     "email": "ada@example.com",
///     "phone": "+44 20 7946 0000",
///     "date": "2024-06-01",
///     "timeSlot": {"startTime": "09:00", "endTime": "10:00"}
///   }'
/// ```
///
/// # Errors
///
/// - `400` missing or malformed fields
/// - `404` unknown expert
/// - `409` the slot is already held
pub async fn create_booking(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), AppError> {
    request.validate()?;

    // An unparseable id cannot name an existing expert
    let expert_id: ExpertId = request
        .expert
        .parse()
        .map_err(|_| AppError::not_found("Expert"))?;

    debug!(correlation_id = %correlation_id.0, %expert_id, "Creating booking");
    let booking = state
        .coordinator
        .reserve(request.into_reservation(expert_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Booking created successfully", booking)),
    ))
}

/// A customer's bookings, newest first, with expert summaries.
///
/// # Errors
///
/// - `400` missing email
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<ApiResponse<Vec<CustomerBooking>>>, AppError> {
    let email = query
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| AppError::validation("Email parameter is required"))?;

    let bookings = state.coordinator.list_by_customer(&email).await?;
    Ok(Json(ApiResponse::ok(bookings)))
}

/// Move a booking to a new status.
///
/// Cancelling frees the slot; the other statuses are mirrored onto it.
///
/// # Errors
///
/// - `400` unknown status
/// - `404` unknown booking
/// - `409` reactivating onto a slot now held by another booking
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let status: BookingStatus = body.status.parse().map_err(|_| {
        AppError::validation("Invalid status").with_details(json!({
            "allowed": BookingStatus::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        }))
    })?;
    let id: BookingId = id.parse().map_err(|_| AppError::not_found("Booking"))?;

    let booking = state.coordinator.set_status(id, status).await?;
    Ok(Json(ApiResponse::with_message(
        format!("Booking status updated to {status}"),
        booking,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            expert: ExpertId::new().to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555".to_string(),
            date: "2024-06-01".to_string(),
            time_slot: TimeSlotBody {
                start_time: "09:00".to_string(),
                end_time: "10:00".to_string(),
            },
            notes: String::new(),
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(is_email_shaped("a@b.co"));
        assert!(is_email_shaped("first.last@mail.example.org"));
        assert!(!is_email_shaped("a@b"));
        assert!(!is_email_shaped("@b.co"));
        assert!(!is_email_shaped("a@.co"));
        assert!(!is_email_shaped("a@b."));
        assert!(!is_email_shaped("a b@c.de"));
        assert!(!is_email_shaped("ada@example.com\nx"));
        assert!(is_email_shaped("user+tag@sub.example.io"));
    }

    #[test]
    fn test_missing_fields_reported_by_name() {
        let mut body = request();
        body.phone = "  ".to_string();
        body.time_slot.end_time = String::new();
        let fields: Vec<_> = body.missing_fields().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["phone", "timeSlot.endTime"]);
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_format_errors_after_presence() {
        let mut body = request();
        body.email = "not-an-email".to_string();
        body.date = "06/01/2024".to_string();
        assert!(body.missing_fields().is_empty());
        let fields: Vec<_> = body.format_errors().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["email", "date"]);
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_reservation_normalizes_customer() {
        let mut body = request();
        body.email = " Ada@Example.COM ".to_string();
        let expert_id = ExpertId::new();
        let reservation = body.into_reservation(expert_id);
        assert_eq!(reservation.customer.email, "ada@example.com");
        assert_eq!(reservation.time_slot, TimeRange::new("09:00", "10:00"));
    }
}
