// src/connectors/mock.rs
//! Scripted `TradingApi` used by the unit tests.

use crate::connectors::traits::TradingApi;
use crate::error::{ApiError, Result};
use crate::types::{Quote, Side, Trade};
use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockApi {
    pages: Vec<Vec<Trade>>,
    quotes: HashMap<String, Quote>,
    /// Zero-based page request at which `trades_page` starts failing.
    fail_trades_at_call: Option<usize>,
    reject_balance: bool,
    calls: Mutex<MockCalls>,
}

#[derive(Default, Clone)]
pub struct MockCalls {
    pub trade_offsets: Vec<usize>,
    pub ticker_requests: Vec<Vec<String>>,
}

impl MockApi {
    pub fn with_pages(pages: Vec<Vec<Trade>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn quote(mut self, pair: &str, last_price: &str) -> Self {
        self.quotes.insert(
            pair.to_string(),
            Quote {
                pair: pair.to_string(),
                last_price: Decimal::from_str(last_price).unwrap(),
            },
        );
        self
    }

    pub fn failing_trades_at(mut self, call: usize) -> Self {
        self.fail_trades_at_call = Some(call);
        self
    }

    pub fn rejecting_balance(mut self) -> Self {
        self.reject_balance = true;
        self
    }

    pub fn calls(&self) -> MockCalls {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TradingApi for MockApi {
    async fn balance(&self) -> Result<Value> {
        if self.reject_balance {
            return Err(ApiError::Authentication("EAPI:Invalid key".into()));
        }
        Ok(json!({ "ZUSD": "1000.0000" }))
    }

    async fn trades_page(&self, offset: usize) -> Result<Vec<Trade>> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.trade_offsets.push(offset);
            calls.trade_offsets.len() - 1
        };

        if self.fail_trades_at_call == Some(call) {
            return Err(ApiError::upstream("simulated outage"));
        }

        Ok(self.pages.get(call).cloned().unwrap_or_default())
    }

    async fn ticker(&self, pairs: &[String]) -> Result<HashMap<String, Quote>> {
        self.calls
            .lock()
            .unwrap()
            .ticker_requests
            .push(pairs.to_vec());

        Ok(pairs
            .iter()
            .filter_map(|pair| self.quotes.get(pair).cloned())
            .map(|quote| (quote.pair.clone(), quote))
            .collect())
    }
}

/// Shorthand for building a trade in tests.
pub fn trade(pair: &str, side: Side, price: &str, volume: &str, time_secs: i64) -> Trade {
    let price = Decimal::from_str(price).unwrap();
    let volume = Decimal::from_str(volume).unwrap();
    Trade {
        pair: pair.to_string(),
        side,
        price,
        volume,
        cost: price * volume,
        fee: Decimal::ZERO,
        time: DateTime::from_timestamp(time_secs, 0).unwrap(),
    }
}
