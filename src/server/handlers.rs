// src/server/handlers.rs
use crate::config::AppConfig;
use crate::connectors::kraken::KrakenClient;
use crate::connectors::traits::TradingApi;
use crate::error::{ApiError, Result};
use crate::pnl::{aggregator, fetcher};
use crate::server::session::SessionStore;
use crate::types::PositionSummary;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub const SESSION_HEADER: &str = "x-session-token";

pub struct AppState {
    pub config: AppConfig,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            sessions: SessionStore::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticateResponse {
    pub success: bool,
    pub token: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub is_authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
}

/// Resolves the caller's session or rejects before any remote call.
async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Arc<dyn TradingApi>> {
    let token = session_token(headers).ok_or(ApiError::Unauthenticated)?;
    state
        .sessions
        .get(&token)
        .await
        .ok_or(ApiError::Unauthenticated)
}

/// Probes the handle's credentials with a balance call and opens a
/// session on success. Any probe failure is reported as rejected
/// credentials.
async fn open_session(state: &AppState, client: Arc<dyn TradingApi>) -> Result<AuthenticateResponse> {
    if let Err(err) = client.balance().await {
        warn!("Authentication rejected: {err}");
        return Err(ApiError::Authentication("invalid API credentials".into()));
    }

    let token = state.sessions.insert(client).await;
    info!("Session {token} opened");

    Ok(AuthenticateResponse {
        success: true,
        token,
    })
}

/// POST /kraken/authenticate
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuthenticateRequest>,
) -> Result<Json<AuthenticateResponse>> {
    let client = KrakenClient::with_base_url(
        request.api_key,
        request.api_secret,
        state.config.kraken_api_url.clone(),
    );

    Ok(Json(open_session(&state, Arc::new(client)).await?))
}

/// GET /kraken/auth-status
pub async fn auth_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<AuthStatusResponse> {
    let is_authenticated = match session_token(&headers) {
        Some(token) => state.sessions.get(&token).await.is_some(),
        None => false,
    };
    Json(AuthStatusResponse { is_authenticated })
}

/// POST /kraken/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<LogoutResponse> {
    if let Some(token) = session_token(&headers) {
        if state.sessions.remove(&token).await {
            info!("Session {token} closed");
        }
    }
    Json(LogoutResponse { success: true })
}

/// GET /kraken/balance — raw balance passthrough.
pub async fn balance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let client = require_session(&state, &headers).await?;
    Ok(Json(client.balance().await?))
}

/// GET /kraken/pnl — the full fetch-then-aggregate pipeline.
///
/// Strictly sequential: the batched quote needs the distinct-pair set,
/// which needs the complete history.
pub async fn pnl(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<HashMap<String, PositionSummary>>> {
    let client = require_session(&state, &headers).await?;

    let page_delay = Duration::from_millis(state.config.trade_page_delay_ms);
    let trades = fetcher::fetch_all_trades(client.as_ref(), page_delay).await?;
    let report = aggregator::compute_pnl(trades, client.as_ref()).await?;

    Ok(Json(report))
}
