use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use common::{KeyValueStore, Result, SimulatedTrade};

use crate::store::read_json;

const TRADES_KEY: &str = "trades_sim";

/// Persisted list of simulated trades, oldest first.
///
/// Trades are append-only: once recorded they are never edited, and the
/// only removal is a full clear.
#[derive(Clone)]
pub struct TradeLedger {
    store: Arc<dyn KeyValueStore>,
}

impl TradeLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Every readable trade in insertion order. Entries that do not decode
    /// are skipped one by one; they never hide the rest of the ledger.
    pub async fn all_trades(&self) -> Result<Vec<SimulatedTrade>> {
        Ok(self
            .raw_entries()
            .await?
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(trade) => Some(trade),
                Err(e) => {
                    warn!(index, error = %e, "Skipping unreadable trade entry");
                    None
                }
            })
            .collect())
    }

    async fn raw_entries(&self) -> Result<Vec<Value>> {
        read_json(self.store.as_ref(), TRADES_KEY).await
    }

    pub async fn trades_for_day(&self, day: &str) -> Result<Vec<SimulatedTrade>> {
        let mut trades = self.all_trades().await?;
        trades.retain(|t| t.day == day);
        Ok(trades)
    }

    pub async fn count_for_day(&self, day: &str) -> Result<usize> {
        Ok(self.trades_for_day(day).await?.len())
    }

    /// Sum of `realized_gain` over every trade recorded for `day`.
    pub async fn day_profit(&self, day: &str) -> Result<f64> {
        Ok(self
            .trades_for_day(day)
            .await?
            .iter()
            .map(|t| t.realized_gain)
            .sum())
    }

    /// Entry times of every recorded trade, used to skip candidates a
    /// previous pass already turned into trades.
    pub async fn recorded_entry_times(&self) -> Result<HashSet<i64>> {
        Ok(self
            .all_trades()
            .await?
            .iter()
            .map(|t| t.entry_time)
            .collect())
    }

    pub async fn append(&self, trade: SimulatedTrade) -> Result<()> {
        self.append_all(vec![trade]).await
    }

    /// Append trades in order with a single write. Stored entries are kept
    /// as they are, unreadable ones included.
    pub async fn append_all(&self, trades: Vec<SimulatedTrade>) -> Result<()> {
        if trades.is_empty() {
            return Ok(());
        }
        let mut all = self.raw_entries().await?;
        for trade in &trades {
            info!(
                day = %trade.day,
                entry_time = trade.entry_time,
                entry = trade.entry_price,
                target = trade.target_price,
                hit = trade.is_resolved(),
                "Trade recorded"
            );
            all.push(serde_json::to_value(trade)?);
        }
        self.store
            .set(TRADES_KEY, &serde_json::to_string(&all)?)
            .await
    }

    pub async fn clear(&self) -> Result<()> {
        debug!("Clearing trade ledger");
        self.store.remove(TRADES_KEY).await
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
