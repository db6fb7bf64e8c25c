//! Error types for the booking core.
//!
//! Storage layers report [`LedgerError`] and [`StoreError`]; the
//! coordinator translates them into the domain taxonomy of [`BookingError`].

use crate::types::SlotKey;
use serde::Serialize;
use thiserror::Error;

/// Message returned whenever a slot is already held by an active booking.
pub const SLOT_TAKEN_MESSAGE: &str = "This time slot is already booked";

/// One field-level validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as seen on the wire
    pub field: String,
    /// Human readable reason
    pub message: String,
}

impl FieldError {
    /// Creates a field error
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Domain errors surfaced by the reservation coordinator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Input was rejected
    #[error("{message}")]
    Validation {
        /// Summary message
        message: String,
        /// Field-level detail
        fields: Vec<FieldError>,
    },

    /// A referenced entity does not exist
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Kind of entity ("Expert", "Booking")
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The slot is already held by an active booking
    #[error("{0}")]
    Conflict(String),

    /// Storage or transport failure
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl BookingError {
    /// Validation error with field detail.
    #[must_use]
    pub fn validation(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            fields,
        }
    }

    /// Not-found error.
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// The canonical slot conflict.
    #[must_use]
    pub fn slot_taken() -> Self {
        Self::Conflict(SLOT_TAKEN_MESSAGE.to_string())
    }
}

/// Errors from a [`BookingLedger`](crate::ledger::BookingLedger).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Another active booking already holds the slot
    #[error("Active booking already exists for slot {0}")]
    UniqueViolation(SlotKey),

    /// Backend failure
    #[error("Ledger storage error: {0}")]
    Storage(String),
}

/// Errors from the expert directory or calendar store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend failure
    #[error("Expert store error: {0}")]
    Storage(String),
}

impl From<LedgerError> for BookingError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::UniqueViolation(_) => Self::slot_taken(),
            LedgerError::Storage(message) => Self::Unexpected(message),
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Storage(message) => Self::Unexpected(message),
        }
    }
}
