use std::collections::HashSet;

use tracing::{debug, info};

use common::{
    BreakoutCandidate, Candle, DayKeyResolver, PlanResult, SimulatedTrade, SkipReason,
    StrategySettings, Zone,
};
use strategy::{ConsolidationDetector, PlannerConfig};

/// Everything one planning pass looks at.
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    /// Breakout candidates in ascending index order.
    pub candidates: &'a [BreakoutCandidate],
    /// The full candle sequence the candidates were scanned from.
    pub candles: &'a [Candle],
    pub zones: &'a [Zone],
    pub auto_supports: &'a [f64],
    pub settings: &'a StrategySettings,
    /// Trades already in the ledger for the day of the last candle.
    pub ledger_today_count: usize,
    /// Entry times of every trade already in the ledger.
    pub recorded_entry_times: &'a HashSet<i64>,
}

/// The gatekeeper between breakout detection and the trade ledger.
///
/// Candidates are evaluated in order. Once the daily cap is reached the rest
/// of the pass is not evaluated at all. "Today" is the day of the last candle
/// and only candidates entering on that day can become trades; the cap counts
/// today's trades only. Vetoes apply in a fixed order: consolidation, already
/// recorded, previous day, non-finite prices, proximity to a manual level,
/// proximity to an auto support, small candle. Planning has no side effects;
/// the caller commits accepted trades to the ledger.
#[derive(Debug, Clone)]
pub struct TradePlanner {
    config: PlannerConfig,
    consolidation: ConsolidationDetector,
    days: DayKeyResolver,
}

impl TradePlanner {
    pub fn new(
        config: PlannerConfig,
        consolidation: ConsolidationDetector,
        days: DayKeyResolver,
    ) -> Self {
        Self {
            config,
            consolidation,
            days,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn days(&self) -> &DayKeyResolver {
        &self.days
    }

    /// The consolidation flag the planner applies to a candle sequence.
    pub fn is_consolidating(&self, candles: &[Candle]) -> bool {
        self.consolidation.is_consolidating(candles)
    }

    pub fn plan(&self, input: PlanInput<'_>) -> Vec<PlanResult> {
        let consolidating = self.is_consolidating(input.candles);
        let take_profit_pct = input.settings.effective_take_profit_percent();
        let proximity = self.config.proximity_percent / 100.0;
        let min_range = self.config.min_range_percent / 100.0;

        let today = input.candles.last().map(|c| self.days.day_key(c.time));
        let mut accepted_today = input.ledger_today_count;
        let mut results = Vec::new();

        for candidate in input.candidates {
            if accepted_today >= self.config.daily_cap {
                debug!(
                    accepted_today,
                    cap = self.config.daily_cap,
                    "Daily trade cap reached, remaining candidates not evaluated"
                );
                break;
            }

            let day = self.days.day_key(candidate.current.time);
            let is_today = today.as_deref() == Some(day.as_str());
            if let Some(reason) =
                self.veto(candidate, &input, consolidating, is_today, proximity, min_range)
            {
                debug!(index = candidate.index, reason = %reason, "Candidate skipped");
                results.push(PlanResult::Skipped {
                    index: candidate.index,
                    reason,
                });
                continue;
            }

            let trade = self.simulate(candidate, input.candles, day, take_profit_pct);
            info!(
                index = candidate.index,
                day = %trade.day,
                entry = trade.entry_price,
                target = trade.target_price,
                hit = trade.target_hit_time.is_some(),
                "Simulated trade accepted"
            );
            results.push(PlanResult::Accepted {
                index: candidate.index,
                trade,
            });
            accepted_today += 1;
        }

        results
    }

    fn veto(
        &self,
        candidate: &BreakoutCandidate,
        input: &PlanInput<'_>,
        consolidating: bool,
        is_today: bool,
        proximity: f64,
        min_range: f64,
    ) -> Option<SkipReason> {
        if consolidating {
            return Some(SkipReason::Consolidation);
        }
        if input
            .recorded_entry_times
            .contains(&candidate.current.time)
        {
            return Some(SkipReason::AlreadyRecorded);
        }
        // Earlier days were capped by their own passes
        if !is_today {
            return Some(SkipReason::PreviousDay);
        }

        let c = &candidate.current;
        let entry = c.open;
        let range = (c.high - c.low) / c.open;
        if !entry.is_finite() || entry <= 0.0 || !range.is_finite() {
            return Some(SkipReason::InvalidPrice);
        }
        if input.zones.iter().any(|z| is_near(entry, z.price, proximity)) {
            return Some(SkipReason::NearManualLevel);
        }
        if input
            .auto_supports
            .iter()
            .any(|&level| is_near(entry, level, proximity))
        {
            return Some(SkipReason::NearAutoSupport);
        }

        if range < min_range {
            return Some(SkipReason::SmallCandle);
        }
        None
    }

    /// Build the long trade for an accepted candidate and search the bounded
    /// window after it for the first candle reaching the target.
    fn simulate(
        &self,
        candidate: &BreakoutCandidate,
        candles: &[Candle],
        day: String,
        take_profit_pct: f64,
    ) -> SimulatedTrade {
        let entry = candidate.current.open;
        let target = entry * (1.0 + take_profit_pct / 100.0);

        let target_hit_time = candles
            .iter()
            .skip(candidate.index + 1)
            .take(self.config.lookahead)
            .find(|c| c.high >= target)
            .map(|c| c.time);

        SimulatedTrade {
            day,
            entry_time: candidate.current.time,
            entry_price: entry,
            target_price: target,
            target_hit_time,
            realized_gain: if target_hit_time.is_some() {
                target - entry
            } else {
                0.0
            },
        }
    }
}

/// Relative distance of `entry` to `level` within `tolerance`. A zero entry
/// is never near anything.
fn is_near(entry: f64, level: f64, tolerance: f64) -> bool {
    (entry - level).abs() / entry <= tolerance
}

// ─── Tests ────────────────────────────────────────────────────────────────────
