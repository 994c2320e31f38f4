use anyhow::{Context, Result};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::models::{PositionEntry, PositionSnapshot, Series};

const BINANCE_FUTURES_API_BASE: &str = "https://fapi.binance.com";
const RATE_LIMIT_RPM: u32 = 1100; // stay under the 1200 weight/min cap
const MAX_RETRIES: u32 = 3;

const KLINE_INTERVAL: &str = "15m";
const KLINE_LIMIT: u32 = 40;

// Type alias for the rate limiter to simplify signatures
type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Client for the Binance USDT-M futures API
///
/// Cloneable; all clones share the same rate limiter. Request signing is not
/// handled here — the client only attaches the API-key header.
#[derive(Clone)]
pub struct BinanceFuturesClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    rate_limiter: Arc<BinanceRateLimiter>,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeInfo {
    symbols: Vec<ExchangeSymbol>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeSymbol {
    symbol: String,
    quote_asset: String,
    contract_type: String,
}

// ============== Implementation ==============

impl BinanceFuturesClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(BINANCE_FUTURES_API_BASE.to_string(), api_key)
    }

    pub fn with_base_url(base_url: String, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap());
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            client,
            base_url,
            api_key,
            rate_limiter,
        })
    }

    /// Make a rate-limited API request with retry logic
    async fn make_request(&self, url: &str) -> Result<reqwest::Response> {
        for attempt in 1..=MAX_RETRIES {
            // Wait for rate limiter
            self.rate_limiter.until_ready().await;

            let mut request = self.client.get(url);
            if let Some(key) = &self.api_key {
                request = request.header("X-MBX-APIKEY", key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let backoff_secs = 2u64.pow(attempt);
                        tracing::warn!(
                            "Binance returned {}, backing off for {}s (attempt {}/{})",
                            status,
                            backoff_secs,
                            attempt,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        continue;
                    }

                    // Other errors (4xx) - don't retry
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    anyhow::bail!("Binance API error ({}): {}", status, error_text);
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let backoff_secs = 2u64.pow(attempt);
                    tracing::warn!(
                        "Network error: {}, retrying in {}s (attempt {}/{})",
                        e,
                        backoff_secs,
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                }
                Err(e) => anyhow::bail!("Network error after {} retries: {}", MAX_RETRIES, e),
            }
        }

        anyhow::bail!("Failed after {} retries", MAX_RETRIES)
    }

    /// List all USDT-margined perpetual futures symbols
    ///
    /// Endpoint: GET /fapi/v1/exchangeInfo
    pub async fn fetch_perpetual_symbols(&self) -> Result<Vec<String>> {
        let url = format!("{}/fapi/v1/exchangeInfo", self.base_url);
        let info: ExchangeInfo = self
            .make_request(&url)
            .await?
            .json()
            .await
            .context("Failed to parse exchangeInfo response")?;

        let symbols: Vec<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.quote_asset == "USDT" && s.contract_type == "PERPETUAL")
            .map(|s| s.symbol)
            .collect();

        tracing::info!("Found {} Binance USDT-M perpetual pairs", symbols.len());
        Ok(symbols)
    }

    /// Fetch the trailing 15m candles for one symbol as an index-aligned Series
    ///
    /// Endpoint: GET /fapi/v1/klines. Binance returns an array of arrays with
    /// string-encoded floats; this transforms it into parallel arrays.
    pub async fn fetch_klines(&self, symbol: &str) -> Result<Series> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, KLINE_INTERVAL, KLINE_LIMIT
        );

        let rows: Vec<Vec<Value>> = self
            .make_request(&url)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse klines response for {}", symbol))?;

        let mut series = Series::default();
        for (i, row) in rows.iter().enumerate() {
            if row.len() < 6 {
                anyhow::bail!("kline row {} for {} has {} fields, expected 6+", i, symbol, row.len());
            }
            series.time.push(
                row[0]
                    .as_i64()
                    .with_context(|| format!("bad kline open time in row {} for {}", i, symbol))?,
            );
            series.open.push(value_to_f64(&row[1], "open", i, symbol)?);
            series.high.push(value_to_f64(&row[2], "high", i, symbol)?);
            series.low.push(value_to_f64(&row[3], "low", i, symbol)?);
            series.close.push(value_to_f64(&row[4], "close", i, symbol)?);
            series.volume.push(value_to_f64(&row[5], "volume", i, symbol)?);
        }

        series
            .validate()
            .with_context(|| format!("malformed kline series for {}", symbol))?;

        Ok(series)
    }

    /// Fetch the account's current position snapshot
    ///
    /// Endpoint: GET /fapi/v2/positionRisk. Entries lacking a usable size
    /// default to 0; the raw entry is retained as opaque detail for the
    /// notification layer.
    pub async fn fetch_positions(&self) -> Result<PositionSnapshot> {
        let url = format!("{}/fapi/v2/positionRisk", self.base_url);
        let rows: Vec<Value> = self
            .make_request(&url)
            .await?
            .json()
            .await
            .context("Failed to parse positionRisk response")?;

        let mut snapshot = PositionSnapshot::new();
        for row in rows {
            let Some(symbol) = row.get("symbol").and_then(Value::as_str) else {
                tracing::warn!("positionRisk entry without a symbol, skipping");
                continue;
            };

            snapshot.insert(
                symbol.to_string(),
                PositionEntry {
                    size: field_as_f64(&row, "positionAmt"),
                    position_value: field_as_f64(&row, "notional"),
                    detail: row.clone(),
                },
            );
        }

        Ok(snapshot)
    }
}

fn value_to_f64(value: &Value, field: &str, index: usize, symbol: &str) -> Result<f64> {
    match value {
        Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("bad {} in kline row {} for {}", field, index, symbol)),
        Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("bad {} in kline row {} for {}", field, index, symbol)),
        other => anyhow::bail!(
            "unexpected {} type in kline row {} for {}: {}",
            field,
            index,
            symbol,
            other
        ),
    }
}

/// Numeric field from a raw position entry; string-encoded on the wire,
/// missing or unparsable values default to 0.
fn field_as_f64(row: &Value, field: &str) -> f64 {
    match row.get(field) {
        Some(Value::String(s)) => s.parse::<f64>().unwrap_or(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_klines_parses_parallel_arrays() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!([
            [1700000000000i64, "100.1", "101.5", "99.8", "100.9", "1234.5", 1700000899999i64, "0", 10, "0", "0", "0"],
            [1700000900000i64, "100.9", "102.0", "100.2", "101.7", "987.6", 1700001799999i64, "0", 12, "0", "0", "0"]
        ]);
        let mock = server
            .mock("GET", "/fapi/v1/klines")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = BinanceFuturesClient::with_base_url(server.url(), None).unwrap();
        let series = client.fetch_klines("BTCUSDT").await.unwrap();

        mock.assert_async().await;
        assert_eq!(series.len(), 2);
        assert_eq!(series.time, vec![1700000000000, 1700000900000]);
        assert_eq!(series.close, vec![100.9, 101.7]);
        assert_eq!(series.volume, vec![1234.5, 987.6]);
        assert!(series.validate().is_ok());
    }

    #[tokio::test]
    async fn test_fetch_perpetual_symbols_filters() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "symbols": [
                { "symbol": "BTCUSDT", "quoteAsset": "USDT", "contractType": "PERPETUAL" },
                { "symbol": "BTCUSDT_240628", "quoteAsset": "USDT", "contractType": "CURRENT_QUARTER" },
                { "symbol": "ETHBTC", "quoteAsset": "BTC", "contractType": "PERPETUAL" },
                { "symbol": "ETHUSDT", "quoteAsset": "USDT", "contractType": "PERPETUAL" }
            ]
        });
        let _mock = server
            .mock("GET", "/fapi/v1/exchangeInfo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = BinanceFuturesClient::with_base_url(server.url(), None).unwrap();
        let symbols = client.fetch_perpetual_symbols().await.unwrap();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[tokio::test]
    async fn test_fetch_positions_defaults_missing_size() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!([
            { "symbol": "BTCUSDT", "positionAmt": "0.500", "notional": "21000.0" },
            { "symbol": "ETHUSDT", "notional": "0" }
        ]);
        let _mock = server
            .mock("GET", "/fapi/v2/positionRisk")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = BinanceFuturesClient::with_base_url(server.url(), None).unwrap();
        let snapshot = client.fetch_positions().await.unwrap();

        assert_eq!(snapshot["BTCUSDT"].size, 0.5);
        assert_eq!(snapshot["BTCUSDT"].position_value, 21000.0);
        // size field absent entirely: defaults to 0, never an error
        assert_eq!(snapshot["ETHUSDT"].size, 0.0);
    }
}
