//! HTTP server: state, routes and lifecycle.

pub mod health;
pub mod routes;
pub mod state;

use crate::app::{BookingApp, BootstrapError};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Serve `app` until a shutdown signal arrives.
///
/// In-flight requests and open sockets get `shutdown_timeout` to finish;
/// after that the server task is abandoned.
///
/// # Errors
///
/// Returns [`BootstrapError::Io`] if the server fails while running.
pub async fn serve(
    app: &BookingApp,
    listener: TcpListener,
    shutdown_timeout: Duration,
) -> Result<(), BootstrapError> {
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let router = app.router();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            return match joined {
                Ok(result) => result.map_err(BootstrapError::from),
                Err(join_error) => {
                    error!(error = %join_error, "Server task failed");
                    Ok(())
                }
            };
        }
        () = shutdown_signal() => {}
    }

    let _ = stop_tx.send(());
    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(Ok(Ok(()))) => info!("Server stopped"),
        Ok(Ok(Err(e))) => return Err(e.into()),
        Ok(Err(join_error)) => error!(error = %join_error, "Server task failed"),
        Err(_) => warn!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Graceful shutdown timed out, dropping remaining connections"
        ),
    }
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
