//! Axum integration for the expert booking engine.
//!
//! Everything HTTP-shaped that the booking server needs but that does not
//! depend on its routes: the JSON error envelope, request extractors,
//! correlation-ID tracking, health reports and the `/ws` expert-room socket.
//!
//! Booking rules stay in `expert-booking-core`; handlers here only translate.
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use expert_booking_web::{RealtimeState, handlers::expert_rooms_socket, with_request_tracking};
//!
//! let realtime = RealtimeState::new(rooms, settings);
//! let router = with_request_tracking(
//!     Router::new().route("/ws", get(expert_rooms_socket)).with_state(realtime),
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use error::{AppError, ErrorCode};
pub use extractors::{ApiJson, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, with_request_tracking};
pub use state::{RealtimeSettings, RealtimeState};
