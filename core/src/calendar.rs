//! Calendar projection: the per-expert slot display state.
//!
//! The calendar is a projection of the ledger. Its only write path is
//! [`CalendarProjection::apply_status`], whose argument [`SlotUpdate`] can
//! only be built inside this crate by the coordinator.

use crate::error::StoreError;
use crate::types::{Booking, BookingId, SlotKey, SlotStatus, TimeSlot};
use std::future::Future;
use std::pin::Pin;

/// One slot write derived from a booking transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotUpdate {
    key: SlotKey,
    status: SlotStatus,
    booking_id: Option<BookingId>,
    owner: BookingId,
}

impl SlotUpdate {
    /// Mirror a booking's current status onto its slot.
    ///
    /// Cancelled releases the slot; every other status is copied along with
    /// the booking id.
    pub(crate) fn for_booking(booking: &Booking) -> Self {
        let (status, booking_id) = match booking.status.slot_status() {
            Some(status) => (status, Some(booking.id)),
            None => (SlotStatus::Available, None),
        };
        Self {
            key: booking.slot_key(),
            status,
            booking_id,
            owner: booking.id,
        }
    }

    /// Slot being written
    #[must_use]
    pub const fn key(&self) -> &SlotKey {
        &self.key
    }

    /// Status to store
    #[must_use]
    pub const fn status(&self) -> SlotStatus {
        self.status
    }

    /// Back-reference to store, `None` when releasing
    #[must_use]
    pub const fn booking_id(&self) -> Option<BookingId> {
        self.booking_id
    }

    /// Booking whose transition produced the update
    #[must_use]
    pub const fn owner(&self) -> BookingId {
        self.owner
    }

    /// Whether the update claims the slot for an active booking.
    ///
    /// Claims always win: the ledger has already guaranteed exclusivity.
    #[must_use]
    pub const fn is_claim(&self) -> bool {
        matches!(self.status, SlotStatus::Pending | SlotStatus::Confirmed)
    }

    /// Whether the update may overwrite a slot currently referencing `current`.
    ///
    /// Non-claiming updates only touch a slot that is free or owned by the
    /// same booking.
    #[must_use]
    pub fn may_overwrite(&self, current: Option<BookingId>) -> bool {
        self.is_claim() || current.is_none_or(|id| id == self.owner)
    }
}

/// Result of applying a [`SlotUpdate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotOutcome {
    /// The slot now reflects the update
    Applied(TimeSlot),
    /// No slot with that key exists; nothing changed
    Missing,
    /// The slot belongs to a different booking and was left untouched
    HeldByOther(BookingId),
}

impl TimeSlot {
    /// Apply an update to this slot following the ownership rule of
    /// [`SlotUpdate::may_overwrite`].
    pub fn apply(&mut self, update: &SlotUpdate) -> SlotOutcome {
        let current = self.booking_id();
        if !update.may_overwrite(current) {
            // may_overwrite only refuses when a different holder exists
            return current.map_or(SlotOutcome::Missing, SlotOutcome::HeldByOther);
        }
        self.set(update.status, update.booking_id);
        SlotOutcome::Applied(self.clone())
    }
}

/// Read and write access to expert calendars.
pub trait CalendarProjection: Send + Sync {
    /// Look up one slot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn find_slot(
        &self,
        key: &SlotKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TimeSlot>, StoreError>> + Send + '_>>;

    /// Apply a coordinator-issued update. A missing slot is a no-op that
    /// reports [`SlotOutcome::Missing`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn apply_status<'a>(
        &'a self,
        update: &'a SlotUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<SlotOutcome, StoreError>> + Send + 'a>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code
mod tests {
    use super::*;
    use crate::types::{BookingStatus, Customer, ExpertId, ReservationRequest, TimeRange};
    use chrono::Utc;

    fn booking() -> Booking {
        Booking::pending(
            ReservationRequest {
                expert_id: ExpertId::new(),
                date: "2024-06-01".to_string(),
                time_slot: TimeRange::new("09:00", "10:00"),
                customer: Customer::new("Ada", "ada@x.io", "555"),
                notes: String::new(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_cancellation_releases_slot() {
        let mut booking = booking();
        booking.status = BookingStatus::Cancelled;
        let update = SlotUpdate::for_booking(&booking);

        assert_eq!(update.status(), SlotStatus::Available);
        assert_eq!(update.booking_id(), None);
        assert_eq!(update.owner(), booking.id);
    }

    #[test]
    fn test_completed_keeps_back_reference() {
        let mut booking = booking();
        booking.status = BookingStatus::Completed;
        let update = SlotUpdate::for_booking(&booking);

        assert_eq!(update.status(), SlotStatus::Completed);
        assert_eq!(update.booking_id(), Some(booking.id));
        assert!(!update.is_claim());
    }

    #[test]
    fn test_release_by_other_booking_is_refused() {
        let holder = booking();
        let mut slot = TimeSlot::available(holder.time_slot.clone());
        assert!(matches!(
            slot.apply(&SlotUpdate::for_booking(&holder)),
            SlotOutcome::Applied(_)
        ));

        let mut stale = booking();
        stale.status = BookingStatus::Cancelled;
        let outcome = slot.apply(&SlotUpdate::for_booking(&stale));

        assert_eq!(outcome, SlotOutcome::HeldByOther(holder.id));
        assert_eq!(slot.status(), SlotStatus::Pending);
        assert_eq!(slot.booking_id(), Some(holder.id));
    }

    #[test]
    fn test_claim_overwrites_completed_slot() {
        let mut previous = booking();
        previous.status = BookingStatus::Completed;
        let mut slot = TimeSlot::available(previous.time_slot.clone());
        slot.apply(&SlotUpdate::for_booking(&previous));

        let next = booking();
        let outcome = slot.apply(&SlotUpdate::for_booking(&next));

        assert!(matches!(outcome, SlotOutcome::Applied(_)));
        assert_eq!(slot.booking_id(), Some(next.id));
    }
}
