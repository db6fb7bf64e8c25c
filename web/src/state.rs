//! Shared state for the real-time handlers.
//!
//! Applications embed [`RealtimeState`] in their own state and expose it
//! with `FromRef`:
//!
//! ```ignore
//! #[derive(Clone)]
//! struct AppState {
//!     realtime: RealtimeState,
//! }
//!
//! impl FromRef<AppState> for RealtimeState {
//!     fn from_ref(state: &AppState) -> Self {
//!         state.realtime.clone()
//!     }
//! }
//! ```

use expert_booking_core::ExpertRooms;
use std::sync::Arc;
use std::time::Duration;

/// Keep-alive settings for WebSocket connections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RealtimeSettings {
    /// Interval between server pings
    pub ping_interval: Duration,
    /// Close a connection after this long without client traffic
    pub idle_timeout: Duration,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

/// State needed by the expert room socket.
#[derive(Clone)]
pub struct RealtimeState {
    /// Topic registry shared with the coordinator
    pub rooms: Arc<ExpertRooms>,
    /// Keep-alive settings
    pub settings: RealtimeSettings,
}

impl RealtimeState {
    /// Create the state.
    #[must_use]
    pub const fn new(rooms: Arc<ExpertRooms>, settings: RealtimeSettings) -> Self {
        Self { rooms, settings }
    }
}
