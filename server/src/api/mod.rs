//! REST API handlers.
//!
//! Successful responses share the envelope
//! `{"success": true, "message"?: .., "data": ..}`; errors are rendered by
//! [`AppError`](expert_booking_web::AppError).

pub mod bookings;
pub mod experts;

use serde::Serialize;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true`
    pub success: bool,
    /// Human-readable outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Envelope without a message
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Envelope with a message
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}
