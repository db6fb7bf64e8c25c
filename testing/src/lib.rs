//! # Expert Booking Testing
//!
//! Testing utilities and helpers for the expert booking engine.
//!
//! This crate provides:
//! - Mock implementations of environment traits
//! - Fixtures for experts, calendars and reservation requests
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use expert_booking_testing::{TestHarness, expert_with_slots, reservation_for};
//!
//! #[tokio::test]
//! async fn test_reserve_then_cancel() {
//!     let harness = TestHarness::new();
//!     let expert = harness.provision(expert_with_slots("Dr. Ada", "Medical", "2024-06-01", &["09:00"])).await;
//!
//!     let booking = harness.coordinator.reserve(reservation_for(&expert, "2024-06-01", "09:00", "a@x.io")).await?;
//!     assert_eq!(harness.notifier.events().len(), 1);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod mocks;

/// Property-based testing strategies for domain types.
pub mod properties {
    use expert_booking_core::BookingStatus;
    use proptest::prelude::*;

    /// Any of the four booking statuses.
    pub fn booking_status() -> impl Strategy<Value = BookingStatus> {
        prop::sample::select(BookingStatus::ALL.to_vec())
    }

    /// A sequence of status transitions.
    pub fn status_sequence(max_len: usize) -> impl Strategy<Value = Vec<BookingStatus>> {
        prop::collection::vec(booking_status(), 1..=max_len)
    }
}

// Re-export commonly used items
pub use fixtures::{TestHarness, expert_with_slots, one_hour, reservation_for};
pub use mocks::{FailingCalendar, ManualClock, RecordingNotifier, test_clock};
