// src/server/mod.rs
pub mod handlers;
pub mod session;

use axum::routing::{get, post};
use axum::Router;
use handlers::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/kraken/authenticate", post(handlers::authenticate))
        .route("/kraken/auth-status", get(handlers::auth_status))
        .route("/kraken/logout", post(handlers::logout))
        .route("/kraken/balance", get(handlers::balance))
        .route("/kraken/pnl", get(handlers::pnl))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the service and serves until ctrl-c.
pub async fn serve(state: Arc<AppState>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Kraken PnL service listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
