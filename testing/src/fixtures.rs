//! Fixtures for experts, calendars and reservations.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test infrastructure
#![allow(clippy::missing_panics_doc)]

use crate::mocks::{ManualClock, RecordingNotifier, test_clock};
use chrono::{Duration, NaiveTime};
use expert_booking_core::{
    BookingEnvironment, CalendarProjection, Clock, Customer, DaySlot, Expert, ExpertDirectory,
    InMemoryExpertStore, InMemoryLedger, ReservationCoordinator, ReservationRequest, SlotKey,
    TimeRange, TimeSlot,
};
use std::sync::Arc;

/// The one-hour range starting at `start` (`HH:MM`).
#[must_use]
pub fn one_hour(start: &str) -> TimeRange {
    let begin = NaiveTime::parse_from_str(start, "%H:%M").expect("start must be HH:MM");
    let end = begin + Duration::hours(1);
    TimeRange::new(start, end.format("%H:%M").to_string())
}

/// An expert with one-hour available slots on a single date.
#[must_use]
pub fn expert_with_slots(name: &str, category: &str, date: &str, starts: &[&str]) -> Expert {
    let mut expert = Expert::new(name, category, 8, 4.7, test_clock().now());
    expert.available_slots = vec![DaySlot::available(
        date,
        starts.iter().map(|start| one_hour(start)),
    )];
    expert
}

/// A reservation of the one-hour slot at `start` for `email`.
#[must_use]
pub fn reservation_for(expert: &Expert, date: &str, start: &str, email: &str) -> ReservationRequest {
    ReservationRequest {
        expert_id: expert.id,
        date: date.to_string(),
        time_slot: one_hour(start),
        customer: Customer::new("Test Customer", email, "+1 555 0100"),
        notes: String::new(),
    }
}

/// A coordinator wired to in-memory backends and a recording notifier.
pub struct TestHarness {
    /// Coordinator under test
    pub coordinator: ReservationCoordinator,
    /// Expert directory and calendar
    pub store: Arc<InMemoryExpertStore>,
    /// Booking ledger
    pub ledger: Arc<InMemoryLedger>,
    /// Captured events
    pub notifier: RecordingNotifier,
    /// Clock shared by the coordinator
    pub clock: ManualClock,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness with a working calendar.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryExpertStore::new());
        Self::build(store.clone(), store)
    }

    /// Harness whose calendar writes go to `calendar` instead of the store.
    #[must_use]
    pub fn with_calendar(calendar: Arc<dyn CalendarProjection>) -> Self {
        Self::build(Arc::new(InMemoryExpertStore::new()), calendar)
    }

    fn build(store: Arc<InMemoryExpertStore>, calendar: Arc<dyn CalendarProjection>) -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let notifier = RecordingNotifier::new();
        let clock = test_clock();
        let directory: Arc<dyn ExpertDirectory> = store.clone();
        let coordinator = ReservationCoordinator::new(BookingEnvironment::new(
            Arc::new(clock.clone()),
            ledger.clone(),
            calendar,
            directory,
            Arc::new(notifier.clone()),
        ));
        Self {
            coordinator,
            store,
            ledger,
            notifier,
            clock,
        }
    }

    /// Provision an expert and return it.
    pub async fn provision(&self, expert: Expert) -> Expert {
        self.store.provision(expert.clone()).await;
        expert
    }

    /// Current calendar state of a slot in the store.
    pub async fn slot(&self, key: &SlotKey) -> Option<TimeSlot> {
        self.store.find_slot(key).await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hour_rolls_over_the_hour() {
        assert_eq!(one_hour("09:00"), TimeRange::new("09:00", "10:00"));
        assert_eq!(one_hour("16:30"), TimeRange::new("16:30", "17:30"));
    }

    #[test]
    fn test_expert_with_slots_starts_available() {
        let expert = expert_with_slots("Dr. Ada", "Medical", "2024-06-01", &["10:00", "09:00"]);
        let slot = expert.find_slot("2024-06-01", &one_hour("09:00")).unwrap();
        assert!(slot.is_available());
        assert_eq!(slot.booking_id(), None);
    }
}
