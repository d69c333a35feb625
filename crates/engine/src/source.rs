use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use common::{Error, Interval, RawCandle, Result};

/// Anything that can hand the engine a candle window for an interval.
///
/// Sources return raw records; normalization happens in the pass so every
/// source goes through the same coercion and validation rules.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch(&self, interval: Interval) -> Result<Vec<RawCandle>>;
}

/// Candles read from a JSON array on disk, already at the wanted interval.
///
/// The file is re-read on every fetch so an external process can keep it
/// up to date between passes.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CandleSource for JsonFileSource {
    async fn fetch(&self, interval: Interval) -> Result<Vec<RawCandle>> {
        let body = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::UpstreamUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        let records: Vec<RawCandle> = serde_json::from_str(&body)?;
        debug!(
            path = %self.path.display(),
            interval = %interval,
            records = records.len(),
            "Candles loaded from file"
        );
        Ok(records)
    }
}

/// Fixed candle set. Handy for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<RawCandle>,
}

impl StaticSource {
    pub fn new(records: Vec<RawCandle>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl CandleSource for StaticSource {
    async fn fetch(&self, _interval: Interval) -> Result<Vec<RawCandle>> {
        Ok(self.records.clone())
    }
}
