//! Expert booking server.
//!
//! REST and WebSocket front end for the reservation engine:
//!
//! ```text
//! /api/experts ──► ExpertDirectory
//! /api/bookings ─► ReservationCoordinator ──► Ledger, Calendar, ExpertRooms
//! /ws ───────────► ExpertRooms (per-expert slot events)
//! ```
//!
//! Storage is selected with `STORAGE_BACKEND` (`memory` or `postgres`).
//! See [`Config`] for every setting.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod app;
pub mod config;
pub mod metrics;
pub mod seed;
pub mod server;

pub use app::{BookingApp, BootstrapError, Storage};
pub use config::{Config, StorageBackend};
