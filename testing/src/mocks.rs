//! Mock implementations of environment traits.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Poisoned locks only occur after a test already panicked

use chrono::{Duration, TimeZone};
use expert_booking_core::{
    CalendarProjection, ChangeNotifier, Clock, DateTime, SlotEvent, SlotKey, SlotOutcome,
    SlotUpdate, StoreError, TimeSlot, Utc,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to.
///
/// Clones share the same instant, so a test can hold one copy and hand
/// another to the coordinator.
///
/// ```
/// use expert_booking_core::Clock;
/// use expert_booking_testing::test_clock;
///
/// let clock = test_clock();
/// let before = clock.now();
/// clock.advance(chrono::Duration::minutes(5));
/// assert_eq!(clock.now() - before, chrono::Duration::minutes(5));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Clock frozen at `instant`
    #[must_use]
    pub fn starting_at(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    /// Move time forward for every clone.
    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.lock().unwrap();
        *instant += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap()
    }
}

/// A [`ManualClock`] at 2025-01-01 00:00:00 UTC.
#[must_use]
pub fn test_clock() -> ManualClock {
    ManualClock::starting_at(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

/// Notifier that records every published event.
///
/// Clones share the same recording.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<SlotEvent>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published so far, in order
    #[must_use]
    pub fn events(&self) -> Vec<SlotEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The most recent event
    #[must_use]
    pub fn last(&self) -> Option<SlotEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    /// Forget recorded events (for test isolation)
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn publish(&self, event: SlotEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.events.lock().unwrap().push(event);
        Box::pin(async {})
    }
}

/// Calendar whose backend is always down.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingCalendar;

impl CalendarProjection for FailingCalendar {
    fn find_slot(
        &self,
        _key: &SlotKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TimeSlot>, StoreError>> + Send + '_>> {
        Box::pin(async { Err(StoreError::Storage("calendar unavailable".to_string())) })
    }

    fn apply_status<'a>(
        &'a self,
        _update: &'a SlotUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<SlotOutcome, StoreError>> + Send + 'a>> {
        Box::pin(async { Err(StoreError::Storage("calendar unavailable".to_string())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_frozen_until_advanced() {
        let clock = test_clock();
        let shared = clock.clone();
        assert_eq!(clock.now(), shared.now());

        shared.advance(Duration::seconds(30));
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 30).unwrap());
    }
}
