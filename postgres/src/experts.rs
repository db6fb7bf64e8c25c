//! `PostgreSQL` expert directory and slot calendar.

use chrono::{DateTime, Utc};
use expert_booking_core::{
    BookingId, CalendarProjection, DaySlot, Expert, ExpertDirectory, ExpertId, ExpertPage,
    ExpertQuery, Pagination, SlotKey, SlotOutcome, SlotStatus, SlotUpdate, StoreError, TimeRange,
    TimeSlot,
};
use sqlx::PgPool;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

const EXPERT_COLUMNS: &str = "id, name, category, experience, rating, bio, specialization, \
                              education, location, languages, consultation_fee, created_at, updated_at";

// $1 = search, $2 = category; both optional
const EXPERT_FILTER: &str = "($1::TEXT IS NULL OR strpos(lower(name), lower($1)) > 0) \
                             AND ($2::TEXT IS NULL OR category = $2)";

#[derive(sqlx::FromRow)]
struct ExpertRow {
    id: Uuid,
    name: String,
    category: String,
    experience: i32,
    rating: f64,
    bio: String,
    specialization: Vec<String>,
    education: String,
    location: String,
    languages: Vec<String>,
    consultation_fee: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ExpertRow {
    fn into_expert(self, available_slots: Vec<DaySlot>) -> Expert {
        Expert {
            id: ExpertId::from_uuid(self.id),
            name: self.name,
            category: self.category,
            experience: u32::try_from(self.experience).unwrap_or_default(),
            rating: self.rating,
            bio: self.bio,
            specialization: self.specialization,
            education: self.education,
            location: self.location,
            languages: self.languages,
            consultation_fee: self.consultation_fee,
            available_slots,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    expert_id: Uuid,
    date: String,
    start_time: String,
    end_time: String,
    status: String,
    booking_id: Option<Uuid>,
}

impl SlotRow {
    fn into_slot(self) -> Result<TimeSlot, StoreError> {
        let status = self
            .status
            .parse::<SlotStatus>()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(TimeSlot::from_parts(
            TimeRange::new(self.start_time, self.end_time),
            status,
            self.booking_id.map(BookingId::from_uuid),
        ))
    }
}

fn storage(context: &str, error: &sqlx::Error) -> StoreError {
    StoreError::Storage(format!("{context}: {error}"))
}

/// Groups slot rows (ordered by date, start) into per-expert day calendars.
fn group_calendars(rows: Vec<SlotRow>) -> Result<HashMap<Uuid, Vec<DaySlot>>, StoreError> {
    let mut calendars: HashMap<Uuid, Vec<DaySlot>> = HashMap::new();
    for row in rows {
        let expert_id = row.expert_id;
        let date = row.date.clone();
        let slot = row.into_slot()?;
        let days = calendars.entry(expert_id).or_default();
        match days.last_mut() {
            Some(day) if day.date == date => day.time_slots.push(slot),
            _ => days.push(DaySlot {
                date,
                time_slots: vec![slot],
            }),
        }
    }
    Ok(calendars)
}

/// Expert profiles in `experts`, calendars in `expert_time_slots`.
#[derive(Clone)]
pub struct PostgresExpertStore {
    pool: PgPool,
}

impl PostgresExpertStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace an expert together with its calendar.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if any statement fails; the
    /// transaction is rolled back.
    #[tracing::instrument(skip(self, expert), fields(expert_id = %expert.id))]
    pub async fn provision(&self, expert: &Expert) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage("Failed to begin transaction", &e))?;

        sqlx::query(
            r"
            INSERT INTO experts (
                id, name, category, experience, rating, bio, specialization,
                education, location, languages, consultation_fee, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                category = EXCLUDED.category,
                experience = EXCLUDED.experience,
                rating = EXCLUDED.rating,
                bio = EXCLUDED.bio,
                specialization = EXCLUDED.specialization,
                education = EXCLUDED.education,
                location = EXCLUDED.location,
                languages = EXCLUDED.languages,
                consultation_fee = EXCLUDED.consultation_fee,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(expert.id.as_uuid())
        .bind(&expert.name)
        .bind(&expert.category)
        .bind(i32::try_from(expert.experience).unwrap_or(i32::MAX))
        .bind(expert.rating)
        .bind(&expert.bio)
        .bind(&expert.specialization)
        .bind(&expert.education)
        .bind(&expert.location)
        .bind(&expert.languages)
        .bind(expert.consultation_fee)
        .bind(expert.created_at)
        .bind(expert.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage("Failed to upsert expert", &e))?;

        sqlx::query("DELETE FROM expert_time_slots WHERE expert_id = $1")
            .bind(expert.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| storage("Failed to clear calendar", &e))?;

        for day in &expert.available_slots {
            for slot in &day.time_slots {
                sqlx::query(
                    r"
                    INSERT INTO expert_time_slots
                        (expert_id, date, start_time, end_time, status, booking_id)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ",
                )
                .bind(expert.id.as_uuid())
                .bind(&day.date)
                .bind(&slot.range().start_time)
                .bind(&slot.range().end_time)
                .bind(slot.status().as_str())
                .bind(slot.booking_id().map(|id| *id.as_uuid()))
                .execute(&mut *tx)
                .await
                .map_err(|e| storage("Failed to insert slot", &e))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| storage("Failed to commit expert", &e))?;
        tracing::debug!("Expert provisioned");
        Ok(())
    }

    async fn calendars_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<DaySlot>>, StoreError> {
        let rows: Vec<SlotRow> = sqlx::query_as(
            r"
            SELECT expert_id, date, start_time, end_time, status, booking_id
            FROM expert_time_slots
            WHERE expert_id = ANY($1)
            ORDER BY expert_id, date, start_time
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("Failed to load calendars", &e))?;
        group_calendars(rows)
    }
}

impl ExpertDirectory for PostgresExpertStore {
    fn get_expert(
        &self,
        id: ExpertId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Expert>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row: Option<ExpertRow> =
                sqlx::query_as(&format!("SELECT {EXPERT_COLUMNS} FROM experts WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| storage("Failed to load expert", &e))?;
            let Some(row) = row else {
                return Ok(None);
            };
            let mut calendars = self.calendars_for(&[row.id]).await?;
            let days = calendars.remove(&row.id).unwrap_or_default();
            Ok(Some(row.into_expert(days)))
        })
    }

    fn list_experts<'a>(
        &'a self,
        query: &'a ExpertQuery,
    ) -> Pin<Box<dyn Future<Output = Result<ExpertPage, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let (total,): (i64,) =
                sqlx::query_as(&format!("SELECT COUNT(*) FROM experts WHERE {EXPERT_FILTER}"))
                    .bind(query.search.as_deref())
                    .bind(query.category.as_deref())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| storage("Failed to count experts", &e))?;

            let rows: Vec<ExpertRow> = sqlx::query_as(&format!(
                "SELECT {EXPERT_COLUMNS} FROM experts WHERE {EXPERT_FILTER} \
                 ORDER BY created_at DESC, name ASC LIMIT $3 OFFSET $4"
            ))
            .bind(query.search.as_deref())
            .bind(query.category.as_deref())
            .bind(i64::from(query.limit))
            .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage("Failed to list experts", &e))?;

            let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
            let mut calendars = self.calendars_for(&ids).await?;
            let experts = rows
                .into_iter()
                .map(|row| {
                    let days = calendars.remove(&row.id).unwrap_or_default();
                    row.into_expert(days)
                })
                .collect();

            Ok(ExpertPage {
                experts,
                pagination: Pagination::new(query, u64::try_from(total).unwrap_or_default()),
            })
        })
    }

    fn categories(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let rows: Vec<(String,)> =
                sqlx::query_as("SELECT DISTINCT category FROM experts ORDER BY category")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| storage("Failed to list categories", &e))?;
            Ok(rows.into_iter().map(|(category,)| category).collect())
        })
    }
}

impl CalendarProjection for PostgresExpertStore {
    fn find_slot(
        &self,
        key: &SlotKey,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TimeSlot>, StoreError>> + Send + '_>> {
        let key = key.clone();
        Box::pin(async move {
            let row: Option<SlotRow> = sqlx::query_as(
                r"
                SELECT expert_id, date, start_time, end_time, status, booking_id
                FROM expert_time_slots
                WHERE expert_id = $1 AND date = $2 AND start_time = $3 AND end_time = $4
                ",
            )
            .bind(key.expert_id.as_uuid())
            .bind(&key.date)
            .bind(&key.time_slot.start_time)
            .bind(&key.time_slot.end_time)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage("Failed to load slot", &e))?;
            row.map(SlotRow::into_slot).transpose()
        })
    }

    fn apply_status<'a>(
        &'a self,
        update: &'a SlotUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<SlotOutcome, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let key = update.key();
            // Guard mirrors SlotUpdate::may_overwrite
            let applied: Option<SlotRow> = sqlx::query_as(
                r"
                UPDATE expert_time_slots
                SET status = $5, booking_id = $6
                WHERE expert_id = $1 AND date = $2 AND start_time = $3 AND end_time = $4
                  AND ($7 OR booking_id IS NULL OR booking_id = $8)
                RETURNING expert_id, date, start_time, end_time, status, booking_id
                ",
            )
            .bind(key.expert_id.as_uuid())
            .bind(&key.date)
            .bind(&key.time_slot.start_time)
            .bind(&key.time_slot.end_time)
            .bind(update.status().as_str())
            .bind(update.booking_id().map(|id| *id.as_uuid()))
            .bind(update.is_claim())
            .bind(update.owner().as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage("Failed to update slot", &e))?;

            if let Some(row) = applied {
                return Ok(SlotOutcome::Applied(row.into_slot()?));
            }

            match self.find_slot(key).await? {
                Some(slot) => Ok(slot
                    .booking_id()
                    .map_or(SlotOutcome::Missing, SlotOutcome::HeldByOther)),
                None => Ok(SlotOutcome::Missing),
            }
        })
    }
}
