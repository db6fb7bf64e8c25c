//! Slot change events and the notifier seam.

use crate::types::{Booking, ExpertId, SlotStatus, TimeRange};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// A slot state transition, as pushed to viewers of an expert's calendar.
///
/// Serialized as `{"type":"slotBooked","expertId":..,"date":..,"timeSlot":{..}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SlotEvent {
    /// A new booking claimed the slot
    SlotBooked {
        /// Expert whose calendar changed
        expert_id: ExpertId,
        /// Calendar date
        date: String,
        /// Slot bounds
        time_slot: TimeRange,
    },
    /// The slot was released
    SlotAvailable {
        /// Expert whose calendar changed
        expert_id: ExpertId,
        /// Calendar date
        date: String,
        /// Slot bounds
        time_slot: TimeRange,
    },
    /// The holding booking changed status
    SlotStatusUpdated {
        /// Expert whose calendar changed
        expert_id: ExpertId,
        /// Calendar date
        date: String,
        /// Slot bounds
        time_slot: TimeRange,
        /// New slot status
        status: SlotStatus,
    },
}

impl SlotEvent {
    /// Event announcing a fresh reservation.
    #[must_use]
    pub fn booked(booking: &Booking) -> Self {
        Self::SlotBooked {
            expert_id: booking.expert,
            date: booking.date.clone(),
            time_slot: booking.time_slot.clone(),
        }
    }

    /// Event announcing a booking's new status.
    #[must_use]
    pub fn for_status(booking: &Booking) -> Self {
        let expert_id = booking.expert;
        let date = booking.date.clone();
        let time_slot = booking.time_slot.clone();
        match booking.status.slot_status() {
            None => Self::SlotAvailable {
                expert_id,
                date,
                time_slot,
            },
            Some(status) => Self::SlotStatusUpdated {
                expert_id,
                date,
                time_slot,
                status,
            },
        }
    }

    /// Expert whose room receives the event
    #[must_use]
    pub const fn expert_id(&self) -> ExpertId {
        match self {
            Self::SlotBooked { expert_id, .. }
            | Self::SlotAvailable { expert_id, .. }
            | Self::SlotStatusUpdated { expert_id, .. } => *expert_id,
        }
    }

    /// Date of the changed slot
    #[must_use]
    pub fn date(&self) -> &str {
        match self {
            Self::SlotBooked { date, .. }
            | Self::SlotAvailable { date, .. }
            | Self::SlotStatusUpdated { date, .. } => date,
        }
    }

    /// Bounds of the changed slot
    #[must_use]
    pub const fn time_slot(&self) -> &TimeRange {
        match self {
            Self::SlotBooked { time_slot, .. }
            | Self::SlotAvailable { time_slot, .. }
            | Self::SlotStatusUpdated { time_slot, .. } => time_slot,
        }
    }

    /// Wire name of the event
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SlotBooked { .. } => "slotBooked",
            Self::SlotAvailable { .. } => "slotAvailable",
            Self::SlotStatusUpdated { .. } => "slotStatusUpdated",
        }
    }

    /// Slot status a client should display after applying the event.
    #[must_use]
    pub const fn implied_status(&self) -> SlotStatus {
        match self {
            Self::SlotBooked { .. } => SlotStatus::Pending,
            Self::SlotAvailable { .. } => SlotStatus::Available,
            Self::SlotStatusUpdated { status, .. } => *status,
        }
    }
}

/// Fan-out of slot events to live subscribers.
///
/// Publishing is fire-and-forget: it never fails and never blocks on a slow
/// subscriber.
pub trait ChangeNotifier: Send + Sync {
    /// Deliver an event to everyone watching its expert.
    fn publish(&self, event: SlotEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}
