// src/pnl/aggregator.rs
use crate::connectors::traits::TradingApi;
use crate::error::Result;
use crate::types::{LedgerEntry, PositionSummary, Side, Trade};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

/// Computes per-pair realized and unrealized PnL over the full trade
/// history, using a weighted-average cost basis.
///
/// Trades are folded in the order the fetcher produced them, not by time.
/// A sell realizes PnL only while there was a long position to close,
/// i.e. the net volume *before* the sell was positive, and is valued
/// against the average buy price in effect at that moment. Net volume may
/// go negative when sells exceed tracked buys; such a position accrues
/// nothing further until buys bring it long again.
///
/// All arithmetic is `Decimal`: sums and products are exact, and the
/// average-price division rounds to 28 significant digits (banker's
/// rounding). No other rounding is applied.
pub async fn compute_pnl(
    trades: Vec<Trade>,
    api: &dyn TradingApi,
) -> Result<HashMap<String, PositionSummary>> {
    if trades.is_empty() {
        return Ok(HashMap::new());
    }

    // Distinct pairs in first-seen order, quoted with one batched call.
    let mut pairs: Vec<String> = Vec::new();
    for trade in &trades {
        if !pairs.contains(&trade.pair) {
            pairs.push(trade.pair.clone());
        }
    }
    let quotes = api.ticker(&pairs).await?;

    debug!("Aggregating {} trades across {} pairs", trades.len(), pairs.len());

    let mut positions: HashMap<String, PositionSummary> = HashMap::new();

    for trade in trades {
        let position = positions.entry(trade.pair.clone()).or_default();

        match trade.side {
            Side::Buy => {
                position.total_bought += trade.cost;
                position.net_volume += trade.volume;
            }
            Side::Sell => {
                let pre_sell_volume = position.net_volume;
                position.total_sold += trade.cost;
                position.net_volume -= trade.volume;

                if pre_sell_volume > Decimal::ZERO {
                    position.realized_pnl +=
                        (trade.price - position.avg_buy_price) * trade.volume;
                }
            }
        }

        if position.net_volume > Decimal::ZERO {
            position.avg_buy_price = position.total_bought / position.net_volume;
        }

        position.trades.push(LedgerEntry {
            time: trade.time,
            side: trade.side,
            price: trade.price,
            volume: trade.volume,
            cost: trade.cost,
            fee: trade.fee,
        });
    }

    for (pair, position) in &mut positions {
        if let Some(quote) = quotes.get(pair) {
            position.current_price = Some(quote.last_price);
            position.unrealized_pnl = Some(if position.net_volume > Decimal::ZERO {
                (quote.last_price - position.avg_buy_price) * position.net_volume
            } else {
                Decimal::ZERO
            });
        }

        // Ledger is served most recent first.
        position.trades.sort_by(|a, b| b.time.cmp(&a.time));
    }

    Ok(positions)
}
