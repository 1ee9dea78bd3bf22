// src/connectors/traits.rs
use crate::error::Result;
use crate::types::{Quote, Trade};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Authenticated trading-API handle the pipeline operates on.
///
/// One handle per session. The pipeline receives it by parameter and
/// never reaches into shared state, so concurrent sessions stay isolated.
#[async_trait]
pub trait TradingApi: Send + Sync {
    /// Raw account balance. Doubles as the credential probe at login.
    async fn balance(&self) -> Result<Value>;

    /// One page of trade history starting at `offset`. Page sizes are
    /// decided by the server; an empty page means the history is exhausted.
    async fn trades_page(&self, offset: usize) -> Result<Vec<Trade>>;

    /// Last-trade prices for all given pairs, fetched in a single
    /// batched call. Pairs the exchange does not quote are simply absent
    /// from the result.
    async fn ticker(&self, pairs: &[String]) -> Result<HashMap<String, Quote>>;
}
