// src/main.rs
use crate::config::AppConfig;
use crate::server::handlers::AppState;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod connectors;
mod error;
mod pnl;
mod server;
mod types;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::new()?;
    let state = Arc::new(AppState::new(config.clone()));

    server::serve(state, &config.bind_addr).await
}
