//! Injected dependencies of the reservation coordinator.

use crate::calendar::CalendarProjection;
use crate::directory::ExpertDirectory;
use crate::ledger::BookingLedger;
use crate::notifier::ChangeNotifier;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Clock trait for time operations
///
/// Abstracts time so tests can pin timestamps.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything the coordinator needs from the outside world.
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Authoritative booking records
    pub ledger: Arc<dyn BookingLedger>,
    /// Expert slot calendars
    pub calendar: Arc<dyn CalendarProjection>,
    /// Expert lookups
    pub directory: Arc<dyn ExpertDirectory>,
    /// Slot change fan-out
    pub notifier: Arc<dyn ChangeNotifier>,
}

impl BookingEnvironment {
    /// Bundle the dependencies.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        ledger: Arc<dyn BookingLedger>,
        calendar: Arc<dyn CalendarProjection>,
        directory: Arc<dyn ExpertDirectory>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            clock,
            ledger,
            calendar,
            directory,
            notifier,
        }
    }
}
