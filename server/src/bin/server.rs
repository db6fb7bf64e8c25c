//! Expert Booking Server
//!
//! Serves the booking API and the real-time slot channel.
//!
//! # Usage
//!
//! ```bash
//! # In-memory storage with demo experts
//! SEED_DEMO_DATA=true cargo run --bin server
//!
//! # PostgreSQL storage
//! STORAGE_BACKEND=postgres DATABASE_URL=postgres://... cargo run --bin server
//! ```

use expert_booking_server::server::serve;
use expert_booking_server::{BookingApp, Config, metrics};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,expert_booking=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Expert Booking Server...");

    let config = Config::from_env();
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        backend = %config.storage.backend,
        environment = %config.server.environment,
        "Configuration loaded"
    );

    let handle = match metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics disabled");
            None
        }
    };

    let app = BookingApp::new(config.clone()).await?.with_metrics(handle);
    if config.seed_demo_data {
        app.seed_demo_data().await?;
    }

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "Expert Booking Server is running");
    tracing::info!("Press Ctrl+C to shutdown");

    serve(&app, listener, config.shutdown_timeout()).await?;

    app.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
