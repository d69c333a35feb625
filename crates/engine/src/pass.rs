use std::sync::Arc;

use tracing::{info, warn};

use common::{
    BreakoutCandidate, Candle, DayKeyResolver, KeyValueStore, PassReport, PlanResult, RawCandle,
    Result, SignalStatus, StrategySettings, SupportLevels,
};
use ledger::{SettingsStore, TradeLedger, ZoneBook};
use planner::{PlanInput, TradePlanner};
use strategy::{
    forecast, prepare_candles, scan_breakouts, CandleValidation, StrategyFileConfig,
    SupportClusterer,
};

/// Minimum candles needed before any breakout analysis is attempted.
const MIN_CANDLES: usize = 3;

/// One full evaluation over a candle window: detect, plan, commit, report.
///
/// The pass owns no candle state between runs. Everything that must survive
/// a pass (trades, zones, settings) lives in the store.
#[derive(Clone)]
pub struct StrategyPass {
    validation: CandleValidation,
    supports: SupportClusterer,
    planner: TradePlanner,
    ledger: TradeLedger,
    zones: ZoneBook,
    settings: SettingsStore,
}

impl StrategyPass {
    pub fn new(
        config: &StrategyFileConfig,
        days: DayKeyResolver,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            validation: config.candle_validation,
            supports: config.supports.clusterer(),
            planner: TradePlanner::new(
                config.planner.clone(),
                config.consolidation.detector(),
                days,
            ),
            ledger: TradeLedger::new(store.clone()),
            zones: ZoneBook::new(store.clone()),
            settings: SettingsStore::new(store),
        }
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn zones(&self) -> &ZoneBook {
        &self.zones
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn days(&self) -> &DayKeyResolver {
        self.planner.days()
    }

    pub async fn run(&self, raw: &[RawCandle]) -> Result<PassReport> {
        let (candles, input_error) = match prepare_candles(raw, self.validation) {
            Ok(candles) => (candles, None),
            Err(e) => {
                warn!(error = %e, records = raw.len(), "Candle input rejected");
                (Vec::new(), Some(e.to_string()))
            }
        };

        let settings = self.settings.load().await?;
        let levels = SupportLevels {
            manual: self.zones.list().await?,
            auto: if settings.auto_support_enabled {
                self.supports.detect(&candles)
            } else {
                Vec::new()
            },
        };
        let forecast = forecast(&candles);

        let Some(last) = candles.last() else {
            return Ok(PassReport {
                day: None,
                candle_count: 0,
                consolidating: false,
                levels,
                candidates: Vec::new(),
                results: Vec::new(),
                trades_today: 0,
                day_profit: 0.0,
                status: SignalStatus::InsufficientData,
                forecast,
                input_error,
            });
        };
        let today = self.days().day_key(last.time);

        if candles.len() < MIN_CANDLES {
            return Ok(PassReport {
                trades_today: self.ledger.count_for_day(&today).await?,
                day_profit: self.ledger.day_profit(&today).await?,
                day: Some(today),
                candle_count: candles.len(),
                consolidating: false,
                levels,
                candidates: Vec::new(),
                results: Vec::new(),
                status: SignalStatus::InsufficientData,
                forecast,
                input_error,
            });
        }

        let consolidating = self.planner.is_consolidating(&candles);
        let candidates = scan_breakouts(&candles);
        let results = self.plan(&candles, &candidates, &levels, &settings, &today).await?;

        let accepted: Vec<_> = results.iter().filter_map(PlanResult::trade).cloned().collect();
        let status = if !accepted.is_empty() {
            SignalStatus::BuySignal
        } else if consolidating {
            SignalStatus::Consolidating
        } else {
            SignalStatus::Waiting
        };
        self.ledger.append_all(accepted).await?;

        let trades_today = self.ledger.count_for_day(&today).await?;
        let day_profit = self.ledger.day_profit(&today).await?;

        info!(
            day = %today,
            candles = candles.len(),
            candidates = candidates.len(),
            status = %status,
            trades_today,
            day_profit,
            probability = forecast.probability,
            "Pass complete"
        );

        Ok(PassReport {
            day: Some(today),
            candle_count: candles.len(),
            consolidating,
            levels,
            candidates,
            results,
            trades_today,
            day_profit,
            status,
            forecast,
            input_error,
        })
    }

    async fn plan(
        &self,
        candles: &[Candle],
        candidates: &[BreakoutCandidate],
        levels: &SupportLevels,
        settings: &StrategySettings,
        today: &str,
    ) -> Result<Vec<PlanResult>> {
        let ledger_today_count = self.ledger.count_for_day(today).await?;
        let recorded = self.ledger.recorded_entry_times().await?;
        Ok(self.planner.plan(PlanInput {
            candidates,
            candles,
            zones: &levels.manual,
            auto_supports: &levels.auto,
            settings,
            ledger_today_count,
            recorded_entry_times: &recorded,
        }))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
