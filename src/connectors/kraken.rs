// src/connectors/kraken.rs
use crate::connectors::traits::TradingApi;
use crate::error::{ApiError, Result};
use crate::types::{Quote, Side, Trade};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256, Sha512};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

type HmacSha512 = Hmac<Sha512>;

pub const KRAKEN_API_URL: &str = "https://api.kraken.com";

pub struct KrakenClient {
    api_key: String,
    api_secret: String,
    http_client: Client,
    base_url: String,
}

/// Every Kraken response wraps the payload in this envelope; failures
/// arrive as a non-empty `error` array inside an HTTP 200.
#[derive(Debug, Deserialize)]
struct KrakenResponse<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TradesHistoryResult {
    #[serde(default)]
    trades: TradePage,
}

/// One page of trades, keyed by txid on the wire.
///
/// Kraken's document order is the server's paging order and the
/// aggregator fold depends on it, so the map is drained straight into a
/// `Vec` instead of a sorted map (which would reorder by txid).
#[derive(Debug, Default)]
struct TradePage(Vec<TradeRecord>);

impl<'de> Deserialize<'de> for TradePage {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PageVisitor;

        impl<'de> Visitor<'de> for PageVisitor {
            type Value = TradePage;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of txid to trade record")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut trades = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((_txid, record)) = map.next_entry::<String, TradeRecord>()? {
                    trades.push(record);
                }
                Ok(TradePage(trades))
            }
        }

        deserializer.deserialize_map(PageVisitor)
    }
}

/// Trade record as Kraken returns it: numerics are strings, time is
/// fractional unix seconds.
#[derive(Debug, Deserialize)]
struct TradeRecord {
    pair: String,
    #[serde(rename = "type")]
    side: String,
    price: String,
    cost: String,
    fee: String,
    vol: String,
    time: f64,
}

#[derive(Debug, Deserialize)]
struct TickerInfo {
    /// Last trade closed: `[price, lot volume]`.
    c: Vec<String>,
}

impl TradeRecord {
    fn into_trade(self) -> Result<Trade> {
        let side = match self.side.as_str() {
            "buy" => Side::Buy,
            "sell" => Side::Sell,
            other => return Err(ApiError::data(format!("unknown trade type '{other}'"))),
        };
        let time = DateTime::from_timestamp_millis((self.time * 1000.0) as i64)
            .ok_or_else(|| ApiError::data(format!("trade time {} out of range", self.time)))?;

        Ok(Trade {
            side,
            time,
            price: parse_decimal("price", &self.price)?,
            volume: parse_decimal("vol", &self.vol)?,
            cost: parse_decimal("cost", &self.cost)?,
            fee: parse_decimal("fee", &self.fee)?,
            pair: self.pair,
        })
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| ApiError::data(format!("bad {field} '{raw}': {e}")))
}

impl KrakenClient {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self::with_base_url(api_key, api_secret, KRAKEN_API_URL.to_string())
    }

    pub fn with_base_url(api_key: String, api_secret: String, base_url: String) -> Self {
        Self {
            api_key,
            api_secret,
            http_client: Client::new(),
            base_url,
        }
    }

    /// API-Sign = base64(HMAC-SHA512(base64decode(secret),
    /// path + SHA256(nonce + postdata))).
    fn sign(&self, path: &str, nonce: &str, postdata: &str) -> Result<String> {
        let secret = BASE64
            .decode(&self.api_secret)
            .map_err(|e| ApiError::Authentication(format!("invalid API secret: {e}")))?;

        let mut sha = Sha256::new();
        sha.update(nonce.as_bytes());
        sha.update(postdata.as_bytes());
        let digest = sha.finalize();

        let mut mac = HmacSha512::new_from_slice(&secret)
            .map_err(|e| ApiError::Authentication(format!("invalid API secret: {e}")))?;
        mac.update(path.as_bytes());
        mac.update(&digest);

        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// POST to a signed private endpoint and unwrap the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T> {
        let path = format!("/0/private/{method}");
        let nonce = Utc::now().timestamp_millis().to_string();

        let mut params = params;
        params.insert(0, ("nonce", nonce.clone()));
        let postdata = serde_urlencoded::to_string(&params)
            .map_err(|e| ApiError::upstream(format!("encoding request: {e}")))?;

        let signature = self.sign(&path, &nonce, &postdata)?;

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .header("API-Key", &self.api_key)
            .header("API-Sign", signature)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(postdata)
            .send()
            .await?;

        unwrap_envelope(response.json::<KrakenResponse<T>>().await?)
    }

    async fn public_get<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .http_client
            .get(format!("{}/0/public/{method}", self.base_url))
            .query(query)
            .send()
            .await?;

        unwrap_envelope(response.json::<KrakenResponse<T>>().await?)
    }
}

fn unwrap_envelope<T>(envelope: KrakenResponse<T>) -> Result<T> {
    if let Some(code) = envelope.error.first() {
        if is_auth_error(code) {
            return Err(ApiError::Authentication(code.clone()));
        }
        return Err(ApiError::upstream(code.clone()));
    }
    envelope
        .result
        .ok_or_else(|| ApiError::upstream("response missing result"))
}

// "EAPI:Rate limit exceeded" shares the EAPI prefix but is transient,
// so the credential codes are listed explicitly.
fn is_auth_error(code: &str) -> bool {
    matches!(
        code,
        "EAPI:Invalid key"
            | "EAPI:Invalid signature"
            | "EAPI:Invalid nonce"
            | "EGeneral:Permission denied"
    )
}

// A quote that does not parse is a malformed ticker response, not bad
// trade data.
fn quote_from_info(pair: String, info: TickerInfo) -> Result<Quote> {
    let last = info
        .c
        .first()
        .ok_or_else(|| ApiError::upstream(format!("ticker for {pair} missing last trade")))?;
    let last_price = Decimal::from_str(last)
        .map_err(|e| ApiError::upstream(format!("bad ticker price '{last}' for {pair}: {e}")))?;
    Ok(Quote { pair, last_price })
}

#[async_trait]
impl TradingApi for KrakenClient {
    async fn balance(&self) -> Result<serde_json::Value> {
        self.call("Balance", vec![]).await
    }

    async fn trades_page(&self, offset: usize) -> Result<Vec<Trade>> {
        let page: TradesHistoryResult = self
            .call("TradesHistory", vec![("ofs", offset.to_string())])
            .await?;

        debug!(
            "TradesHistory page at offset {}: {} trades",
            offset,
            page.trades.0.len()
        );

        page.trades
            .0
            .into_iter()
            .map(TradeRecord::into_trade)
            .collect()
    }

    async fn ticker(&self, pairs: &[String]) -> Result<HashMap<String, Quote>> {
        let pair_list = pairs.join(",");
        let infos: HashMap<String, TickerInfo> = self
            .public_get("Ticker", &[("pair", pair_list.as_str())])
            .await?;

        let mut quotes = HashMap::with_capacity(infos.len());
        for (pair, info) in infos {
            let quote = quote_from_info(pair, info)?;
            quotes.insert(quote.pair.clone(), quote);
        }
        Ok(quotes)
    }
}
