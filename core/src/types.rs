//! Domain types for expert bookings.
//!
//! This module contains the identifiers, value objects and entities shared by
//! the booking ledger, the slot calendar and the change notifier.
//!
//! The two stores deliberately duplicate slot data: a [`Booking`] carries its
//! own copy of the date and [`TimeRange`] so that its history survives later
//! calendar edits, while the expert's [`DaySlot`]s carry a weak
//! [`BookingId`] back-reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an expert
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpertId(Uuid);

impl ExpertId {
    /// Creates a new random `ExpertId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `ExpertId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExpertId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExpertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExpertId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Unique identifier for a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

// ============================================================================
// Slot addressing
// ============================================================================

/// Half-open wall-clock interval `[start_time, end_time)`, e.g. `09:00`–`10:00`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    /// Local start time (`HH:MM`)
    pub start_time: String,
    /// Local end time (`HH:MM`)
    pub end_time: String,
}

impl TimeRange {
    /// Creates a new time range
    #[must_use]
    pub fn new(start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_time, self.end_time)
    }
}

/// Address of one slot: (expert, date, start, end).
///
/// This is the key of the active-booking uniqueness constraint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotKey {
    /// Expert owning the calendar
    pub expert_id: ExpertId,
    /// Calendar date (`YYYY-MM-DD`)
    pub date: String,
    /// Slot bounds
    pub time_slot: TimeRange,
}

impl SlotKey {
    /// Creates a new slot key
    #[must_use]
    pub fn new(expert_id: ExpertId, date: impl Into<String>, time_slot: TimeRange) -> Self {
        Self {
            expert_id,
            date: date.into(),
            time_slot,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.expert_id, self.date, self.time_slot)
    }
}

// ============================================================================
// Statuses
// ============================================================================

/// Error returned when a status string is not one of the known values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid status: {0}")]
pub struct ParseStatusError(pub String);

/// Display status of a calendar time slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotStatus {
    /// Free to reserve
    Available,
    /// Held by a booking awaiting confirmation
    Pending,
    /// Held by a confirmed booking
    Confirmed,
    /// Consultation took place
    Completed,
    /// Legacy "taken" marker from older calendars
    Booked,
}

impl SlotStatus {
    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Booked => "Booked",
        }
    }

    /// Whether a slot in this status can be reserved.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(Self::Available),
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Completed" => Ok(Self::Completed),
            "Booked" => Ok(Self::Booked),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Lifecycle status of a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Created, awaiting confirmation
    Pending,
    /// Confirmed by the expert
    Confirmed,
    /// Consultation took place
    Completed,
    /// Cancelled; the slot is released
    Cancelled,
}

impl BookingStatus {
    /// Every status a booking can be set to.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Confirmed, Self::Completed, Self::Cancelled];

    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Active bookings occupy their slot exclusively.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// The slot status mirroring this booking status, `None` when the slot is released.
    #[must_use]
    pub const fn slot_status(self) -> Option<SlotStatus> {
        match self {
            Self::Pending => Some(SlotStatus::Pending),
            Self::Confirmed => Some(SlotStatus::Confirmed),
            Self::Completed => Some(SlotStatus::Completed),
            Self::Cancelled => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

// ============================================================================
// Calendar
// ============================================================================

/// One bookable window in an expert's calendar.
///
/// Fields are private: the status only changes through
/// [`SlotUpdate`](crate::calendar::SlotUpdate), and `isAvailable` is derived
/// from the status when serialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TimeSlotRecord", into = "TimeSlotRecord")]
pub struct TimeSlot {
    range: TimeRange,
    status: SlotStatus,
    booking_id: Option<BookingId>,
}

impl TimeSlot {
    /// A freshly provisioned, available slot.
    #[must_use]
    pub fn available(range: TimeRange) -> Self {
        Self {
            range,
            status: SlotStatus::Available,
            booking_id: None,
        }
    }

    /// Rehydrate a slot from storage.
    #[must_use]
    pub const fn from_parts(
        range: TimeRange,
        status: SlotStatus,
        booking_id: Option<BookingId>,
    ) -> Self {
        Self {
            range,
            status,
            booking_id,
        }
    }

    /// Slot bounds
    #[must_use]
    pub const fn range(&self) -> &TimeRange {
        &self.range
    }

    /// Current display status
    #[must_use]
    pub const fn status(&self) -> SlotStatus {
        self.status
    }

    /// Booking currently referenced by the slot
    #[must_use]
    pub const fn booking_id(&self) -> Option<BookingId> {
        self.booking_id
    }

    /// Always exactly `status == Available`.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.status.is_available()
    }

    /// Whether this slot has the given bounds.
    #[must_use]
    pub fn matches(&self, range: &TimeRange) -> bool {
        self.range == *range
    }

    pub(crate) fn set(&mut self, status: SlotStatus, booking_id: Option<BookingId>) {
        self.status = status;
        self.booking_id = booking_id;
    }
}

/// Wire shape of a [`TimeSlot`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeSlotRecord {
    start_time: String,
    end_time: String,
    #[serde(default)]
    is_available: bool,
    #[serde(default = "default_slot_status")]
    status: SlotStatus,
    #[serde(default)]
    booking_id: Option<BookingId>,
}

const fn default_slot_status() -> SlotStatus {
    SlotStatus::Available
}

impl From<TimeSlotRecord> for TimeSlot {
    fn from(record: TimeSlotRecord) -> Self {
        // isAvailable is derived, whatever the input claimed
        Self::from_parts(
            TimeRange::new(record.start_time, record.end_time),
            record.status,
            record.booking_id,
        )
    }
}

impl From<TimeSlot> for TimeSlotRecord {
    fn from(slot: TimeSlot) -> Self {
        Self {
            is_available: slot.is_available(),
            status: slot.status,
            booking_id: slot.booking_id,
            start_time: slot.range.start_time,
            end_time: slot.range.end_time,
        }
    }
}

/// All slots of one expert on one date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySlot {
    /// Calendar date (`YYYY-MM-DD`), unique per expert
    pub date: String,
    /// Slots ordered by start time
    pub time_slots: Vec<TimeSlot>,
}

impl DaySlot {
    /// Creates a day of available slots, ordered by start time.
    #[must_use]
    pub fn available(date: impl Into<String>, ranges: impl IntoIterator<Item = TimeRange>) -> Self {
        let mut time_slots: Vec<TimeSlot> = ranges.into_iter().map(TimeSlot::available).collect();
        time_slots.sort_by(|a, b| a.range.start_time.cmp(&b.range.start_time));
        Self {
            date: date.into(),
            time_slots,
        }
    }
}

// ============================================================================
// Experts
// ============================================================================

/// A professional offering consultations, with an embedded slot calendar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    /// Expert ID
    pub id: ExpertId,
    /// Display name
    pub name: String,
    /// Category (e.g. "Medical", "Legal")
    pub category: String,
    /// Years of experience
    pub experience: u32,
    /// Rating between 0 and 5
    pub rating: f64,
    /// Short biography
    #[serde(default)]
    pub bio: String,
    /// Specializations
    #[serde(default)]
    pub specialization: Vec<String>,
    /// Education summary
    #[serde(default)]
    pub education: String,
    /// Location
    #[serde(default)]
    pub location: String,
    /// Spoken languages
    #[serde(default)]
    pub languages: Vec<String>,
    /// Fee per consultation
    #[serde(default)]
    pub consultation_fee: f64,
    /// Calendar, one entry per date
    #[serde(default)]
    pub available_slots: Vec<DaySlot>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Expert {
    /// Creates an expert with an empty calendar and default profile fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        experience: u32,
        rating: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExpertId::new(),
            name: name.into(),
            category: category.into(),
            experience,
            rating: rating.clamp(0.0, 5.0),
            bio: String::new(),
            specialization: Vec::new(),
            education: String::new(),
            location: String::new(),
            languages: vec!["English".to_string()],
            consultation_fee: 0.0,
            available_slots: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    /// Read-only projection used when listing a customer's bookings.
    #[must_use]
    pub fn summary(&self) -> ExpertSummary {
        ExpertSummary {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
            rating: self.rating,
        }
    }

    /// Find the slot with the given date and bounds.
    #[must_use]
    pub fn find_slot(&self, date: &str, range: &TimeRange) -> Option<&TimeSlot> {
        self.available_slots
            .iter()
            .find(|day| day.date == date)
            .and_then(|day| day.time_slots.iter().find(|slot| slot.matches(range)))
    }

    pub(crate) fn find_slot_mut(&mut self, date: &str, range: &TimeRange) -> Option<&mut TimeSlot> {
        self.available_slots
            .iter_mut()
            .find(|day| day.date == date)
            .and_then(|day| day.time_slots.iter_mut().find(|slot| slot.matches(range)))
    }
}

/// Expert fields joined onto a customer's bookings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertSummary {
    /// Expert ID
    pub id: ExpertId,
    /// Display name
    pub name: String,
    /// Category
    pub category: String,
    /// Rating
    pub rating: f64,
}

// ============================================================================
// Bookings
// ============================================================================

/// Contact details of the customer making a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Full name
    pub name: String,
    /// Email, trimmed and lower-cased
    pub email: String,
    /// Phone number
    pub phone: String,
}

impl Customer {
    /// Creates a customer, normalizing whitespace and email case.
    #[must_use]
    pub fn new(name: impl AsRef<str>, email: impl AsRef<str>, phone: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            email: normalize_email(email.as_ref()),
            phone: phone.as_ref().trim().to_string(),
        }
    }
}

/// Canonical form of an email used for storage and lookups.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A request to reserve one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationRequest {
    /// Expert to book
    pub expert_id: ExpertId,
    /// Calendar date (`YYYY-MM-DD`)
    pub date: String,
    /// Slot bounds
    pub time_slot: TimeRange,
    /// Who is booking
    pub customer: Customer,
    /// Free-form notes
    pub notes: String,
}

impl ReservationRequest {
    /// The slot this request targets.
    #[must_use]
    pub fn slot_key(&self) -> SlotKey {
        SlotKey::new(self.expert_id, self.date.clone(), self.time_slot.clone())
    }
}

/// The authoritative record of one reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Booked expert
    pub expert: ExpertId,
    /// Customer name
    pub name: String,
    /// Customer email (lower-cased)
    pub email: String,
    /// Customer phone
    pub phone: String,
    /// Calendar date
    pub date: String,
    /// Slot bounds, copied from the request
    pub time_slot: TimeRange,
    /// Free-form notes
    pub notes: String,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A new pending booking for the request.
    #[must_use]
    pub fn pending(request: ReservationRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: BookingId::new(),
            expert: request.expert_id,
            name: request.customer.name,
            email: request.customer.email,
            phone: request.customer.phone,
            date: request.date,
            time_slot: request.time_slot,
            notes: request.notes.trim().to_string(),
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// The slot this booking refers to.
    #[must_use]
    pub fn slot_key(&self) -> SlotKey {
        SlotKey::new(self.expert, self.date.clone(), self.time_slot.clone())
    }
}

/// A booking as listed for its customer, with the expert joined in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBooking {
    /// Booking ID
    pub id: BookingId,
    /// Expert projection, `None` if the expert no longer exists
    pub expert: Option<ExpertSummary>,
    /// Customer name
    pub name: String,
    /// Customer email
    pub email: String,
    /// Customer phone
    pub phone: String,
    /// Calendar date
    pub date: String,
    /// Slot bounds
    pub time_slot: TimeRange,
    /// Notes
    pub notes: String,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CustomerBooking {
    /// Joins a booking with its expert summary.
    #[must_use]
    pub fn new(booking: Booking, expert: Option<ExpertSummary>) -> Self {
        Self {
            id: booking.id,
            expert,
            name: booking.name,
            email: booking.email,
            phone: booking.phone,
            date: booking.date,
            time_slot: booking.time_slot,
            notes: booking.notes,
            status: booking.status,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}
