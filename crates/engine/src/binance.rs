use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use common::{Candle, DayKeyResolver, Error, Interval, RawCandle, Result};
use strategy::resample;

use crate::source::CandleSource;

const BASE_URL: &str = "https://api.binance.com";
const DEFAULT_SYMBOL: &str = "BTCUSDT";
/// One-minute klines fetched per pass (Binance maximum per request is 1500).
const KLINE_LIMIT: u32 = 1500;

/// Public Binance spot klines, resampled to the requested interval.
///
/// Always fetches one-minute candles and aggregates locally so bucket
/// boundaries follow the configured timezone rather than UTC.
pub struct BinanceKlines {
    http: Client,
    base_url: String,
    symbol: String,
    days: DayKeyResolver,
}

impl BinanceKlines {
    pub fn new(days: DayKeyResolver) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            symbol: DEFAULT_SYMBOL.to_string(),
            days,
        })
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_minutes(&self) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval=1m&limit={KLINE_LIMIT}",
            self.base_url, self.symbol
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!("HTTP {status}: {body}")));
        }
        parse_klines(&body)
    }
}

#[async_trait]
impl CandleSource for BinanceKlines {
    async fn fetch(&self, interval: Interval) -> Result<Vec<RawCandle>> {
        let minutes = self.fetch_minutes().await?;
        let candles = resample(&minutes, interval, &self.days);
        debug!(
            symbol = %self.symbol,
            interval = %interval,
            minutes = minutes.len(),
            candles = candles.len(),
            "Klines fetched"
        );
        Ok(candles.iter().map(RawCandle::from).collect())
    }
}

/// Parse a klines response body.
///
/// Each row is `[open_time_ms, "open", "high", "low", "close", "volume", ...]`.
/// Rows too short to carry OHLC are skipped.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    Ok(rows
        .iter()
        .filter(|row| row.len() >= 5)
        .map(|row| Candle {
            time: row[0].as_i64().unwrap_or(0) / 1000,
            open: number(&row[1]),
            high: number(&row[2]),
            low: number(&row[3]),
            close: number(&row[4]),
            volume: row.get(5).map(number).unwrap_or(0.0),
        })
        .collect())
}

fn number(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().unwrap_or(f64::NAN),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_prices_and_millisecond_times() {
        let body = r#"[
            [1704067200000, "100.5", "101.0", "99.5", "100.8", "12.3", 1704067259999, "0", 10],
            [1704067260000, "100.8", "102.0", "100.1", "101.9", "7.0", 1704067319999, "0", 5]
        ]"#;
        let candles = parse_klines(body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time, 1_704_067_200);
        assert_eq!(candles[0].open, 100.5);
        assert_eq!(candles[1].high, 102.0);
        assert_eq!(candles[1].volume, 7.0);
    }

    #[test]
    fn short_rows_are_skipped_and_missing_volume_is_zero() {
        let candles = parse_klines(r#"[[0, "1", "2"], [60000, "1", "2", "0.5", "1.5"]]"#).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].time, 60);
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn error_body_is_json_error() {
        assert!(matches!(
            parse_klines(r#"{"code":-1121,"msg":"Invalid symbol."}"#),
            Err(Error::Json(_))
        ));
    }
}
