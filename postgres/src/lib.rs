//! `PostgreSQL` storage for the expert booking engine.
//!
//! This crate provides PostgreSQL-backed implementations of the core storage
//! traits:
//!
//! - [`PostgresLedger`]: [`BookingLedger`](expert_booking_core::BookingLedger)
//!   with the active-slot constraint enforced by a partial unique index
//! - [`PostgresExpertStore`]: [`ExpertDirectory`](expert_booking_core::ExpertDirectory)
//!   and [`CalendarProjection`](expert_booking_core::CalendarProjection)
//!
//! # Example
//!
//! ```ignore
//! use expert_booking_postgres::{connect, migrate, PostgresLedger, PostgresExpertStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = connect("postgres://localhost/bookings", 5, Duration::from_secs(30)).await?;
//!     migrate(&pool).await?;
//!     let ledger = PostgresLedger::new(pool.clone());
//!     let experts = PostgresExpertStore::new(pool);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod experts;
mod ledger;

pub use experts::PostgresExpertStore;
pub use ledger::PostgresLedger;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Open a connection pool.
///
/// # Errors
///
/// Returns the underlying [`sqlx::Error`] if the database is unreachable.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    connect_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(connect_timeout)
        .connect(database_url)
        .await?;
    tracing::info!(max_connections, "Connected to PostgreSQL");
    Ok(pool)
}

/// Run the embedded migrations.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Cheap liveness probe used by readiness checks.
///
/// # Errors
///
/// Returns the underlying [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
