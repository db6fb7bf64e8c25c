//! Application bootstrap.
//!
//! [`BookingApp`] wires the storage backend, the topic registry and the
//! reservation coordinator together once at startup. Everything else
//! receives these handles explicitly.

use crate::config::{Config, StorageBackend};
use crate::seed::demo_experts;
use crate::server::routes::build_router;
use crate::server::state::AppState;
use axum::Router;
use expert_booking_core::{
    BookingEnvironment, BookingLedger, CalendarProjection, Clock, Expert, ExpertDirectory,
    ExpertRooms, InMemoryExpertStore, InMemoryLedger, ReservationCoordinator, StoreError,
    SystemClock,
};
use expert_booking_postgres::{PostgresExpertStore, PostgresLedger};
use expert_booking_web::RealtimeState;
use expert_booking_web::handlers::HealthReport;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors raised while bringing the application up.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Database connection failed
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Migrations failed
    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Provisioning experts failed
    #[error("Failed to provision experts: {0}")]
    Store(#[from] StoreError),

    /// Listener or signal setup failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The expert store behind the directory and calendar.
#[derive(Clone)]
pub enum Storage {
    /// Process-local store
    Memory(Arc<InMemoryExpertStore>),
    /// `PostgreSQL` store and its pool
    Postgres {
        /// Shared connection pool
        pool: PgPool,
        /// Expert profiles and calendars
        experts: Arc<PostgresExpertStore>,
    },
}

impl Storage {
    /// Insert or replace an expert with its calendar.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend rejects the write.
    pub async fn provision(&self, expert: Expert) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => {
                store.provision(expert).await;
                Ok(())
            }
            Self::Postgres { experts, .. } => experts.provision(&expert).await,
        }
    }

    /// Probe the backend for the readiness endpoint.
    pub async fn readiness(&self) -> HealthReport {
        match self {
            Self::Memory(_) => HealthReport::new().check("storage", Ok::<(), Infallible>(())),
            Self::Postgres { pool, .. } => {
                HealthReport::new().check("database", expert_booking_postgres::ping(pool).await)
            }
        }
    }

    /// Backend name for logs
    #[must_use]
    pub const fn backend(&self) -> StorageBackend {
        match self {
            Self::Memory(_) => StorageBackend::Memory,
            Self::Postgres { .. } => StorageBackend::Postgres,
        }
    }

    fn directory(&self) -> Arc<dyn ExpertDirectory> {
        match self {
            Self::Memory(store) => store.clone(),
            Self::Postgres { experts, .. } => experts.clone(),
        }
    }

    fn calendar(&self) -> Arc<dyn CalendarProjection> {
        match self {
            Self::Memory(store) => store.clone(),
            Self::Postgres { experts, .. } => experts.clone(),
        }
    }
}

/// The assembled booking application.
#[derive(Clone)]
pub struct BookingApp {
    config: Config,
    storage: Storage,
    rooms: Arc<ExpertRooms>,
    coordinator: ReservationCoordinator,
    clock: Arc<dyn Clock>,
    metrics: Option<PrometheusHandle>,
}

impl BookingApp {
    /// Connect the configured backend and build the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] if the database is unreachable or a
    /// migration fails.
    pub async fn new(config: Config) -> Result<Self, BootstrapError> {
        let (storage, ledger): (Storage, Arc<dyn BookingLedger>) = match config.storage.backend {
            StorageBackend::Memory => {
                let ledger: Arc<dyn BookingLedger> = Arc::new(InMemoryLedger::new());
                (Storage::Memory(Arc::new(InMemoryExpertStore::new())), ledger)
            }
            StorageBackend::Postgres => {
                let pool = expert_booking_postgres::connect(
                    &config.storage.database_url,
                    config.storage.max_connections,
                    Duration::from_secs(config.storage.connect_timeout),
                )
                .await?;
                expert_booking_postgres::migrate(&pool).await?;
                let ledger: Arc<dyn BookingLedger> = Arc::new(PostgresLedger::new(pool.clone()));
                let experts = Arc::new(PostgresExpertStore::new(pool.clone()));
                (Storage::Postgres { pool, experts }, ledger)
            }
        };

        let rooms = Arc::new(ExpertRooms::new(
            config.realtime.subscriber_buffer,
            config.realtime.max_connections,
        ));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let coordinator = ReservationCoordinator::new(BookingEnvironment::new(
            Arc::clone(&clock),
            ledger,
            storage.calendar(),
            storage.directory(),
            rooms.clone(),
        ));

        info!(
            backend = %storage.backend(),
            max_connections = config.realtime.max_connections,
            "Application initialized"
        );

        Ok(Self {
            config,
            storage,
            rooms,
            coordinator,
            clock,
            metrics: None,
        })
    }

    /// Serve `/metrics` from this recorder handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Provision the sample experts.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Store`] if an expert cannot be written.
    pub async fn seed_demo_data(&self) -> Result<usize, BootstrapError> {
        let experts = demo_experts(self.clock.now(), &mut rand::thread_rng());
        let count = experts.len();
        for expert in experts {
            self.storage.provision(expert).await?;
        }
        info!(count, "Demo experts provisioned");
        Ok(count)
    }

    /// Handler state for the router.
    #[must_use]
    pub fn state(&self) -> AppState {
        AppState {
            coordinator: self.coordinator.clone(),
            directory: self.storage.directory(),
            storage: self.storage.clone(),
            realtime: RealtimeState::new(Arc::clone(&self.rooms), self.config.realtime.settings()),
            metrics: self.metrics.clone(),
        }
    }

    /// The complete HTTP router.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state(), &self.config)
    }

    /// Release backend resources.
    pub async fn close(&self) {
        if let Storage::Postgres { pool, .. } = &self.storage {
            pool.close().await;
            info!("Database pool closed");
        }
    }

    /// Loaded configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Storage backend
    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Topic registry shared with the WebSocket handler
    #[must_use]
    pub const fn rooms(&self) -> &Arc<ExpertRooms> {
        &self.rooms
    }

    /// Reservation coordinator
    #[must_use]
    pub const fn coordinator(&self) -> &ReservationCoordinator {
        &self.coordinator
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code
mod tests {
    use super::*;
    use expert_booking_core::ExpertQuery;

    #[tokio::test]
    async fn test_memory_app_seeds_directory() {
        let app = BookingApp::new(Config::default()).await.unwrap();
        let seeded = app.seed_demo_data().await.unwrap();

        let page = app
            .state()
            .directory
            .list_experts(&ExpertQuery::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, u64::try_from(seeded).unwrap());
        assert_eq!(page.experts.len(), 5);
    }

    #[tokio::test]
    async fn test_reseeding_replaces_demo_experts() {
        let app = BookingApp::new(Config::default()).await.unwrap();
        let seeded = app.seed_demo_data().await.unwrap();
        app.seed_demo_data().await.unwrap();

        let page = app
            .state()
            .directory
            .list_experts(&ExpertQuery::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, u64::try_from(seeded).unwrap());
    }

    #[tokio::test]
    async fn test_memory_readiness_is_ok() {
        let app = BookingApp::new(Config::default()).await.unwrap();
        let report = app.storage().readiness().await;
        assert!(report.is_healthy());
        assert_eq!(report.checks[0].name, "storage");
    }
}
