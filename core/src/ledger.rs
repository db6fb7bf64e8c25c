//! Booking ledger: the authoritative record of every reservation.
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` so the ledger can be shared as
//! `Arc<dyn BookingLedger>` inside [`BookingEnvironment`](crate::environment::BookingEnvironment).

use crate::error::LedgerError;
use crate::types::{Booking, BookingId, BookingStatus, SlotKey};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::RwLock;

/// Storage of bookings with an active-slot uniqueness constraint.
///
/// Implementations must guarantee that at most one booking whose status is
/// active (`Pending` or `Confirmed`) exists per [`SlotKey`]. Both
/// [`insert`](Self::insert) and [`update_status`](Self::update_status)
/// enforce it atomically and report a breach as
/// [`LedgerError::UniqueViolation`].
pub trait BookingLedger: Send + Sync {
    /// Find the active booking holding a slot, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the backend fails.
    fn find_active(
        &self,
        key: &SlotKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Booking>, LedgerError>> + Send + '_>>;

    /// Insert a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UniqueViolation`] if the booking is active and
    /// its slot is already held, [`LedgerError::Storage`] on backend failure.
    fn insert(
        &self,
        booking: Booking,
    ) -> Pin<Box<dyn Future<Output = Result<Booking, LedgerError>> + Send + '_>>;

    /// Load a booking by id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the backend fails.
    fn get(
        &self,
        id: BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Booking>, LedgerError>> + Send + '_>>;

    /// Change a booking's status, returning the updated booking or `None`
    /// if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UniqueViolation`] when moving into an active
    /// status while another booking holds the slot.
    fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Booking>, LedgerError>> + Send + '_>>;

    /// All bookings for a normalized email, newest created first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the backend fails.
    fn list_by_email(
        &self,
        email: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Booking>, LedgerError>> + Send + '_>>;
}

#[derive(Default)]
struct LedgerTables {
    bookings: HashMap<BookingId, Booking>,
    // slot -> active holder
    active: HashMap<SlotKey, BookingId>,
    // insertion sequence, tiebreak for equal timestamps
    order: HashMap<BookingId, u64>,
    next_seq: u64,
}

/// In-memory ledger.
///
/// A single write lock covers the check and the write, which makes the
/// uniqueness constraint authoritative under concurrent callers.
#[derive(Default)]
pub struct InMemoryLedger {
    tables: RwLock<LedgerTables>,
}

impl InMemoryLedger {
    /// Creates an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bookings
    pub async fn len(&self) -> usize {
        self.tables.read().await.bookings.len()
    }

    /// Whether the ledger holds no bookings
    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.bookings.is_empty()
    }
}

impl BookingLedger for InMemoryLedger {
    fn find_active(
        &self,
        key: &SlotKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Booking>, LedgerError>> + Send + '_>> {
        let key = key.clone();
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables
                .active
                .get(&key)
                .and_then(|id| tables.bookings.get(id))
                .cloned())
        })
    }

    fn insert(
        &self,
        booking: Booking,
    ) -> Pin<Box<dyn Future<Output = Result<Booking, LedgerError>> + Send + '_>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let key = booking.slot_key();

            if booking.status.is_active() {
                if tables.active.contains_key(&key) {
                    return Err(LedgerError::UniqueViolation(key));
                }
                tables.active.insert(key, booking.id);
            }

            let seq = tables.next_seq;
            tables.next_seq += 1;
            tables.order.insert(booking.id, seq);
            tables.bookings.insert(booking.id, booking.clone());

            Ok(booking)
        })
    }

    fn get(
        &self,
        id: BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Booking>, LedgerError>> + Send + '_>> {
        Box::pin(async move { Ok(self.tables.read().await.bookings.get(&id).cloned()) })
    }

    fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Booking>, LedgerError>> + Send + '_>> {
        Box::pin(async move {
            let mut tables = self.tables.write().await;
            let Some(current) = tables.bookings.get(&id) else {
                return Ok(None);
            };
            let key = current.slot_key();

            if status.is_active() {
                match tables.active.get(&key) {
                    Some(holder) if *holder != id => {
                        return Err(LedgerError::UniqueViolation(key));
                    }
                    _ => {
                        tables.active.insert(key, id);
                    }
                }
            } else if tables.active.get(&key) == Some(&id) {
                tables.active.remove(&key);
            }

            let Some(booking) = tables.bookings.get_mut(&id) else {
                return Ok(None);
            };
            booking.status = status;
            booking.updated_at = at;
            Ok(Some(booking.clone()))
        })
    }

    fn list_by_email(
        &self,
        email: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Booking>, LedgerError>> + Send + '_>> {
        let email = email.to_string();
        Box::pin(async move {
            let tables = self.tables.read().await;
            let mut matches: Vec<(u64, Booking)> = tables
                .bookings
                .values()
                .filter(|booking| booking.email == email)
                .map(|booking| {
                    let seq = tables.order.get(&booking.id).copied().unwrap_or_default();
                    (seq, booking.clone())
                })
                .collect();

            matches.sort_by(|(seq_a, a), (seq_b, b)| {
                b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
            });

            Ok(matches.into_iter().map(|(_, booking)| booking).collect())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code
mod tests {
    use super::*;
    use crate::types::{Customer, ExpertId, ReservationRequest, TimeRange};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn booking(expert: ExpertId, email: &str, at: DateTime<Utc>) -> Booking {
        Booking::pending(
            ReservationRequest {
                expert_id: expert,
                date: "2024-06-01".to_string(),
                time_slot: TimeRange::new("09:00", "10:00"),
                customer: Customer::new("Ada", email, "555"),
                notes: String::new(),
            },
            at,
        )
    }

    #[tokio::test]
    async fn test_second_active_insert_is_rejected() {
        let ledger = InMemoryLedger::new();
        let expert = ExpertId::new();

        ledger.insert(booking(expert, "a@x.io", now())).await.unwrap();
        let result = ledger.insert(booking(expert, "b@x.io", now())).await;

        assert!(matches!(result, Err(LedgerError::UniqueViolation(_))));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_and_reactivation_conflicts() {
        let ledger = InMemoryLedger::new();
        let expert = ExpertId::new();
        let first = ledger.insert(booking(expert, "a@x.io", now())).await.unwrap();

        ledger
            .update_status(first.id, BookingStatus::Cancelled, now())
            .await
            .unwrap();
        assert!(ledger.find_active(&first.slot_key()).await.unwrap().is_none());

        let second = ledger.insert(booking(expert, "b@x.io", now())).await.unwrap();
        let reactivate = ledger
            .update_status(first.id, BookingStatus::Pending, now())
            .await;
        assert!(matches!(reactivate, Err(LedgerError::UniqueViolation(_))));

        let holder = ledger.find_active(&first.slot_key()).await.unwrap().unwrap();
        assert_eq!(holder.id, second.id);
        let first = ledger.get(first.id).await.unwrap().unwrap();
        assert_eq!(first.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_setting_same_active_status_is_allowed() {
        let ledger = InMemoryLedger::new();
        let first = ledger
            .insert(booking(ExpertId::new(), "a@x.io", now()))
            .await
            .unwrap();

        let updated = ledger
            .update_status(first.id, BookingStatus::Confirmed, now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_unknown_booking_update_returns_none() {
        let ledger = InMemoryLedger::new();
        let result = ledger
            .update_status(BookingId::new(), BookingStatus::Cancelled, now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_by_email_newest_first() {
        let ledger = InMemoryLedger::new();
        let older = booking(ExpertId::new(), "a@x.io", now());
        let newer = booking(ExpertId::new(), "a@x.io", now() + Duration::minutes(5));
        let tie = booking(ExpertId::new(), "a@x.io", now() + Duration::minutes(5));
        let other = booking(ExpertId::new(), "b@x.io", now());

        for b in [older.clone(), newer.clone(), tie.clone(), other] {
            ledger.insert(b).await.unwrap();
        }

        let listed: Vec<BookingId> = ledger
            .list_by_email("a@x.io")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(listed, vec![tie.id, newer.id, older.id]);
    }
}
