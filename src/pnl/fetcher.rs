// src/pnl/fetcher.rs
use crate::connectors::traits::TradingApi;
use crate::error::Result;
use crate::types::Trade;
use std::time::Duration;
use tracing::info;

/// Pulls the complete trade history, one page at a time.
///
/// The offset advances by however many trades the server actually
/// returned, so variable page sizes are fine. An empty page means the
/// history is exhausted. Requests are strictly sequential, with a fixed
/// pause between them to stay inside the exchange's private-endpoint
/// rate limit (proactive pacing, not reactive retry).
///
/// Any page failure aborts the whole fetch; there is no partial result.
pub async fn fetch_all_trades(api: &dyn TradingApi, page_delay: Duration) -> Result<Vec<Trade>> {
    let mut all_trades = Vec::new();
    let mut offset = 0usize;

    loop {
        let page = api.trades_page(offset).await?;
        if page.is_empty() {
            break;
        }

        offset += page.len();
        all_trades.extend(page);

        tokio::time::sleep(page_delay).await;
    }

    info!("Fetched {} trades in total", all_trades.len());
    Ok(all_trades)
}
