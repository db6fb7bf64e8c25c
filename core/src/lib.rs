//! # Expert Booking Core
//!
//! Slot reservation and consistency engine for expert consultations.
//!
//! ## Components
//!
//! - **Booking Ledger** ([`ledger`]): authoritative booking records with an
//!   active-slot uniqueness constraint
//! - **Calendar Projection** ([`calendar`]): per-expert slot display state,
//!   written only by the coordinator
//! - **Reservation Coordinator** ([`coordinator`]): creation and status
//!   transitions across both stores
//! - **Change Notifier** ([`notifier`], [`rooms`]): per-expert fan-out of slot events
//!
//! ## Control flow
//!
//! ```text
//! request → Coordinator → Ledger check → Ledger insert → Calendar update → SlotEvent
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let store = Arc::new(InMemoryExpertStore::new());
//! let rooms = Arc::new(ExpertRooms::default());
//! let coordinator = ReservationCoordinator::new(BookingEnvironment::new(
//!     Arc::new(SystemClock),
//!     Arc::new(InMemoryLedger::new()),
//!     store.clone(),
//!     store,
//!     rooms,
//! ));
//!
//! let booking = coordinator.reserve(request).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod calendar;
pub mod coordinator;
pub mod directory;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod notifier;
pub mod rooms;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub use calendar::{CalendarProjection, SlotOutcome, SlotUpdate};
pub use coordinator::ReservationCoordinator;
pub use directory::{ExpertDirectory, ExpertPage, ExpertQuery, Pagination};
pub use environment::{BookingEnvironment, Clock, SystemClock};
pub use error::{BookingError, FieldError, LedgerError, StoreError};
pub use ledger::{BookingLedger, InMemoryLedger};
pub use memory::InMemoryExpertStore;
pub use notifier::{ChangeNotifier, SlotEvent};
pub use rooms::{ExpertRooms, Subscriber, SubscriberId};
pub use types::{
    Booking, BookingId, BookingStatus, Customer, CustomerBooking, DaySlot, Expert, ExpertId,
    ExpertSummary, ReservationRequest, SlotKey, SlotStatus, TimeRange, TimeSlot,
};
