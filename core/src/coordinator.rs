//! Reservation coordinator.
//!
//! The only component that writes bookings or slots. Every transition
//! follows the same order: ledger first (authoritative), then the calendar
//! projection (lenient), then the change event (fire-and-forget).

use crate::calendar::{SlotOutcome, SlotUpdate};
use crate::environment::BookingEnvironment;
use crate::error::{BookingError, FieldError, LedgerError};
use crate::notifier::SlotEvent;
use crate::types::{
    Booking, BookingId, BookingStatus, CustomerBooking, ExpertId, ExpertSummary,
    ReservationRequest, normalize_email,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Calendar writes one `set_status` may make while catching up with
/// transitions that committed after its own.
const MAX_CALENDAR_PASSES: usize = 3;

/// Orchestrates reservations across the ledger, calendar and notifier.
#[derive(Clone)]
pub struct ReservationCoordinator {
    env: BookingEnvironment,
}

impl ReservationCoordinator {
    /// Creates a coordinator over the given dependencies
    #[must_use]
    pub const fn new(env: BookingEnvironment) -> Self {
        Self { env }
    }

    /// Shared dependencies
    #[must_use]
    pub const fn environment(&self) -> &BookingEnvironment {
        &self.env
    }

    /// Reserve a slot for a customer.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] for blank required fields
    /// - [`BookingError::NotFound`] if the expert does not exist
    /// - [`BookingError::Conflict`] if the slot is already held
    /// - [`BookingError::Unexpected`] on storage failure
    #[tracing::instrument(
        skip(self, request),
        fields(expert_id = %request.expert_id, date = %request.date, slot = %request.time_slot)
    )]
    pub async fn reserve(&self, request: ReservationRequest) -> Result<Booking, BookingError> {
        let result = self.try_reserve(request).await;
        let outcome = match &result {
            Ok(_) => "created",
            Err(BookingError::Conflict(_)) => "conflict",
            Err(BookingError::NotFound { .. }) => "not_found",
            Err(BookingError::Validation { .. }) => "invalid",
            Err(BookingError::Unexpected(_)) => "error",
        };
        metrics::counter!("booking_reservations_total", "outcome" => outcome).increment(1);
        result
    }

    async fn try_reserve(&self, request: ReservationRequest) -> Result<Booking, BookingError> {
        validate(&request)?;

        let expert_id = request.expert_id;
        if self.env.directory.get_expert(expert_id).await?.is_none() {
            return Err(BookingError::not_found("Expert", expert_id));
        }

        let key = request.slot_key();
        if let Some(holder) = self.env.ledger.find_active(&key).await? {
            debug!(holder = %holder.id, "Slot already held");
            return Err(BookingError::slot_taken());
        }

        let booking = Booking::pending(request, self.env.clock.now());
        let booking = match self.env.ledger.insert(booking).await {
            Ok(booking) => booking,
            Err(LedgerError::UniqueViolation(key)) => {
                info!(%key, "Concurrent reservation lost the race");
                return Err(BookingError::slot_taken());
            }
            Err(error) => return Err(error.into()),
        };

        // Claims overwrite any holder, so the slot is booked or missing;
        // both announce the new reservation
        match self.sync_calendar(&booking, "reserve").await {
            Some(SlotOutcome::Applied(_) | SlotOutcome::Missing) | None => {}
            Some(SlotOutcome::HeldByOther(holder)) => {
                warn!(%holder, "Claim refused by calendar");
            }
        }
        self.env.notifier.publish(SlotEvent::booked(&booking)).await;

        info!(booking_id = %booking.id, "Booking created");
        Ok(booking)
    }

    /// Move a booking to a new status and mirror it onto the calendar.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the booking does not exist
    /// - [`BookingError::Conflict`] when reactivating onto a slot held by another booking
    /// - [`BookingError::Unexpected`] on storage failure
    #[tracing::instrument(skip(self), fields(booking_id = %id, status = %status))]
    pub async fn set_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let now = self.env.clock.now();
        let booking = match self.env.ledger.update_status(id, status, now).await {
            Ok(Some(booking)) => booking,
            Ok(None) => return Err(BookingError::not_found("Booking", id)),
            Err(LedgerError::UniqueViolation(key)) => {
                info!(%key, "Reactivation rejected, slot held by another booking");
                return Err(BookingError::slot_taken());
            }
            Err(error) => return Err(error.into()),
        };
        metrics::counter!("booking_status_updates_total", "status" => status.as_str())
            .increment(1);

        let (mirrored, outcome) = self.mirror_latest(booking.clone()).await;
        match outcome {
            Some(SlotOutcome::HeldByOther(_)) => {}
            _ => {
                self.env
                    .notifier
                    .publish(SlotEvent::for_status(&mirrored))
                    .await;
            }
        }

        info!("Booking status updated");
        Ok(booking)
    }

    /// Mirror `booking` onto its slot, then keep re-mirroring while the
    /// ledger shows a newer status.
    ///
    /// Two transitions of one booking can commit to the ledger in one order
    /// and reach the calendar in the other. Re-reading after each write means
    /// whichever call writes last also sees the final ledger status.
    async fn mirror_latest(&self, booking: Booking) -> (Booking, Option<SlotOutcome>) {
        let mut current = booking;
        let mut outcome = self.sync_calendar(&current, "set_status").await;
        for _ in 1..MAX_CALENDAR_PASSES {
            match self.env.ledger.get(current.id).await {
                Ok(Some(latest)) if latest.status != current.status => {
                    debug!(
                        from = %current.status,
                        to = %latest.status,
                        "Ledger moved on, re-mirroring"
                    );
                    current = latest;
                    outcome = self.sync_calendar(&current, "set_status").await;
                }
                Ok(_) => break,
                Err(error) => {
                    warn!(%error, "Could not re-read booking after calendar sync");
                    break;
                }
            }
        }
        (current, outcome)
    }

    /// A customer's bookings, newest first, joined with expert summaries.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] if the email is blank
    /// - [`BookingError::Unexpected`] on storage failure
    #[tracing::instrument(skip(self, email))]
    pub async fn list_by_customer(
        &self,
        email: &str,
    ) -> Result<Vec<CustomerBooking>, BookingError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(BookingError::validation(
                "Email is required",
                vec![FieldError::new("email", "Email is required")],
            ));
        }

        let bookings = self.env.ledger.list_by_email(&email).await?;
        let mut experts: HashMap<ExpertId, Option<ExpertSummary>> = HashMap::new();
        let mut listed = Vec::with_capacity(bookings.len());

        for booking in bookings {
            let summary = match experts.get(&booking.expert) {
                Some(summary) => summary.clone(),
                None => {
                    let summary = self
                        .env
                        .directory
                        .get_expert(booking.expert)
                        .await?
                        .map(|expert| expert.summary());
                    experts.insert(booking.expert, summary.clone());
                    summary
                }
            };
            listed.push(CustomerBooking::new(booking, summary));
        }

        debug!(count = listed.len(), "Listed customer bookings");
        Ok(listed)
    }

    /// Apply the booking's status to its slot. Failures never propagate:
    /// the ledger has already committed.
    async fn sync_calendar(&self, booking: &Booking, operation: &'static str) -> Option<SlotOutcome> {
        let update = SlotUpdate::for_booking(booking);
        match self.env.calendar.apply_status(&update).await {
            Ok(outcome @ SlotOutcome::Applied(_)) => Some(outcome),
            Ok(SlotOutcome::Missing) => {
                warn!(key = %update.key(), operation, "Calendar slot not found, booking kept");
                metrics::counter!("booking_calendar_drift_total", "operation" => operation)
                    .increment(1);
                Some(SlotOutcome::Missing)
            }
            Ok(SlotOutcome::HeldByOther(holder)) => {
                debug!(key = %update.key(), %holder, "Slot owned by another booking, left untouched");
                Some(SlotOutcome::HeldByOther(holder))
            }
            Err(error) => {
                warn!(key = %update.key(), operation, %error, "Calendar update failed, booking kept");
                metrics::counter!("booking_calendar_drift_total", "operation" => operation)
                    .increment(1);
                None
            }
        }
    }
}

/// Required-field checks on a reservation request.
fn validate(request: &ReservationRequest) -> Result<(), BookingError> {
    let required = [
        ("name", request.customer.name.as_str()),
        ("email", request.customer.email.as_str()),
        ("phone", request.customer.phone.as_str()),
        ("date", request.date.as_str()),
        ("timeSlot.startTime", request.time_slot.start_time.as_str()),
        ("timeSlot.endTime", request.time_slot.end_time.as_str()),
    ];
    let fields: Vec<FieldError> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| FieldError::new(*field, format!("{field} is required")))
        .collect();

    if fields.is_empty() {
        Ok(())
    } else {
        Err(BookingError::validation("Please provide all required fields", fields))
    }
}
