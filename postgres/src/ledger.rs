//! `PostgreSQL` booking ledger.

use crate::is_unique_violation;
use chrono::{DateTime, Utc};
use expert_booking_core::{
    Booking, BookingId, BookingLedger, BookingStatus, ExpertId, LedgerError, SlotKey, TimeRange,
};
use sqlx::PgPool;
use std::future::Future;
use std::pin::Pin;
use tracing::Instrument;
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, expert_id, name, email, phone, date, start_time, end_time, \
                               notes, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    expert_id: Uuid,
    name: String,
    email: String,
    phone: String,
    date: String,
    start_time: String,
    end_time: String,
    notes: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = LedgerError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<BookingStatus>()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            expert: ExpertId::from_uuid(row.expert_id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            date: row.date,
            time_slot: TimeRange::new(row.start_time, row.end_time),
            notes: row.notes,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn storage(context: &str, error: &sqlx::Error) -> LedgerError {
    LedgerError::Storage(format!("{context}: {error}"))
}

/// Booking ledger backed by the `bookings` table.
///
/// The partial unique index `idx_bookings_active_slot` is the authoritative
/// guard against two active bookings on one slot.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Create a ledger over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: BookingId) -> Result<Option<Booking>, LedgerError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| storage("Failed to load booking", &e))?;
        row.map(Booking::try_from).transpose()
    }
}

impl BookingLedger for PostgresLedger {
    fn find_active(
        &self,
        key: &SlotKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Booking>, LedgerError>> + Send + '_>> {
        let key = key.clone();
        Box::pin(async move {
            let row: Option<BookingRow> = sqlx::query_as(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings \
                 WHERE expert_id = $1 AND date = $2 AND start_time = $3 AND end_time = $4 \
                   AND status IN ('Pending', 'Confirmed')"
            ))
            .bind(key.expert_id.as_uuid())
            .bind(&key.date)
            .bind(&key.time_slot.start_time)
            .bind(&key.time_slot.end_time)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage("Failed to query active booking", &e))?;
            row.map(Booking::try_from).transpose()
        }
        .instrument(tracing::debug_span!("ledger.find_active")))
    }

    fn insert(
        &self,
        booking: Booking,
    ) -> Pin<Box<dyn Future<Output = Result<Booking, LedgerError>> + Send + '_>> {
        let booking_id = booking.id;
        Box::pin(async move {
            let result = sqlx::query(
                r"
                INSERT INTO bookings (
                    id, expert_id, name, email, phone, date, start_time, end_time,
                    notes, status, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ",
            )
            .bind(booking.id.as_uuid())
            .bind(booking.expert.as_uuid())
            .bind(&booking.name)
            .bind(&booking.email)
            .bind(&booking.phone)
            .bind(&booking.date)
            .bind(&booking.time_slot.start_time)
            .bind(&booking.time_slot.end_time)
            .bind(&booking.notes)
            .bind(booking.status.as_str())
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => {
                    tracing::debug!(booking_id = %booking.id, "Booking inserted");
                    Ok(booking)
                }
                Err(e) if is_unique_violation(&e) => {
                    Err(LedgerError::UniqueViolation(booking.slot_key()))
                }
                Err(e) => Err(storage("Failed to insert booking", &e)),
            }
        }
        .instrument(tracing::debug_span!("ledger.insert", booking_id = %booking_id)))
    }

    fn get(
        &self,
        id: BookingId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Booking>, LedgerError>> + Send + '_>> {
        Box::pin(self.fetch(id))
    }

    fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        at: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Booking>, LedgerError>> + Send + '_>> {
        Box::pin(async move {
            let result: Result<Option<BookingRow>, sqlx::Error> = sqlx::query_as(&format!(
                "UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1 \
                 RETURNING {BOOKING_COLUMNS}"
            ))
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(at)
            .fetch_optional(&self.pool)
            .await;

            match result {
                Ok(row) => row.map(Booking::try_from).transpose(),
                Err(e) if is_unique_violation(&e) => {
                    let key = self
                        .fetch(id)
                        .await?
                        .map(|booking| booking.slot_key())
                        .ok_or_else(|| storage("Booking vanished during update", &e))?;
                    Err(LedgerError::UniqueViolation(key))
                }
                Err(e) => Err(storage("Failed to update booking status", &e)),
            }
        }
        .instrument(tracing::debug_span!(
            "ledger.update_status",
            booking_id = %id,
            status = %status
        )))
    }

    fn list_by_email(
        &self,
        email: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Booking>, LedgerError>> + Send + '_>> {
        let email = email.to_string();
        Box::pin(async move {
            let rows: Vec<BookingRow> = sqlx::query_as(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE email = $1 \
                 ORDER BY created_at DESC, seq DESC"
            ))
            .bind(&email)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage("Failed to list bookings", &e))?;
            rows.into_iter().map(Booking::try_from).collect()
        })
    }
}
