//! Backend for a "what do we eat" lunch poll: search restaurants through a
//! provider proxy, shortlist them onto a ballot, share the ballot as a poll,
//! and collect one yes/no selection set per voter.
//!
//! Polls are idempotent by content: the poll id is a stable hash of the
//! candidate set, so two people sharing the same shortlist end up on the same
//! poll. Voters may resubmit; the latest submission per name wins.

pub mod ballot;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod search;
pub mod sim;
pub mod state;
pub mod tally;

use log::info;
use tokio::net::TcpListener;
use tokio::signal;

use crate::error::AppError;
use crate::state::AppState;

pub async fn run() -> Result<(), AppError> {
    info!("Initializing state...");
    let state = AppState::new().await?;
    let port = state.config.port;

    let app = routes::router(state);

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::Internal(format!("failed to bind {address}: {e}")))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("server error: {e}")))?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
