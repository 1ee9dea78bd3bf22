// src/types.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// A single fill from the account's trade history.
/// The exchange is the source of truth; never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub pair: String,
    #[serde(rename = "type")]
    pub side: Side,
    pub price: Decimal,
    pub volume: Decimal,
    pub cost: Decimal,
    pub fee: Decimal,
    pub time: DateTime<Utc>,
}

/// Point-in-time market price for a pair, from the batched ticker call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub pair: String,
    pub last_price: Decimal,
}

/// Normalized trade record embedded in a position's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub side: Side,
    pub price: Decimal,
    pub volume: Decimal,
    pub cost: Decimal,
    pub fee: Decimal,
}

/// Running position for one trading pair, built up over a single
/// aggregation pass and discarded after the response is returned.
///
/// `avg_buy_price` is only meaningful while `net_volume` is positive;
/// otherwise it holds the last value computed. `current_price` and
/// `unrealized_pnl` are set only for pairs the ticker responded for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSummary {
    #[serde(rename = "totalBought")]
    pub total_bought: Decimal,
    #[serde(rename = "totalSold")]
    pub total_sold: Decimal,
    #[serde(rename = "netVolume")]
    pub net_volume: Decimal,
    #[serde(rename = "avgBuyPrice")]
    pub avg_buy_price: Decimal,
    #[serde(rename = "realizedPnL")]
    pub realized_pnl: Decimal,
    #[serde(rename = "unrealizedPnL", skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl: Option<Decimal>,
    #[serde(rename = "currentPrice", skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Decimal>,
    pub trades: Vec<LedgerEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"sell\"");
    }

    #[test]
    fn position_summary_json_shape() {
        let summary = PositionSummary {
            total_bought: Decimal::from(330),
            total_sold: Decimal::ZERO,
            net_volume: Decimal::from(3),
            avg_buy_price: Decimal::from(110),
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Some(Decimal::from(120)),
            current_price: Some(Decimal::from(150)),
            trades: vec![],
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["totalBought"], "330");
        assert_eq!(json["avgBuyPrice"], "110");
        assert_eq!(json["realizedPnL"], "0");
        assert_eq!(json["unrealizedPnL"], "120");
        assert_eq!(json["currentPrice"], "150");
    }

    #[test]
    fn quoteless_position_omits_market_fields() {
        let summary = PositionSummary::default();
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("currentPrice").is_none());
        assert!(json.get("unrealizedPnL").is_none());
        assert_eq!(json["netVolume"], "0");
    }

    #[test]
    fn ledger_entry_time_is_iso8601() {
        let entry = LedgerEntry {
            time: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            side: Side::Buy,
            price: Decimal::from_str("100.5").unwrap(),
            volume: Decimal::ONE,
            cost: Decimal::from_str("100.5").unwrap(),
            fee: Decimal::from_str("0.26").unwrap(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["time"], "2023-11-14T22:13:20Z");
        assert_eq!(json["type"], "buy");
    }
}
