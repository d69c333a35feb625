use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One OHLC candle. `time` is the candle open in UTC epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Candle-like record as delivered by a source, before normalization.
///
/// Every field is kept as raw JSON so numeric strings, nulls and missing
/// fields can be told apart: a missing field is `None`, an explicit `null`
/// is `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    #[serde(default, deserialize_with = "present")]
    pub time: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub open: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub high: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub low: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub close: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub volume: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl From<&Candle> for RawCandle {
    fn from(c: &Candle) -> Self {
        Self {
            time: Some(Value::from(c.time)),
            open: Some(Value::from(c.open)),
            high: Some(Value::from(c.high)),
            low: Some(Value::from(c.low)),
            close: Some(Value::from(c.close)),
            volume: Some(Value::from(c.volume)),
        }
    }
}

/// Kind of a user-drawn price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Support,
    Resistance,
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneKind::Support => write!(f, "support"),
            ZoneKind::Resistance => write!(f, "resistance"),
        }
    }
}

/// Manual support/resistance zone. Duplicates are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(rename = "type")]
    pub kind: ZoneKind,
    pub price: f64,
}

/// A cluster of candle lows found by the support clusterer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportCluster {
    pub mean: f64,
    pub member_count: usize,
}

/// Direction of an opposite-candle break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakDirection {
    Bull,
    Bear,
}

impl std::fmt::Display for BreakDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakDirection::Bull => write!(f, "bull"),
            BreakDirection::Bear => write!(f, "bear"),
        }
    }
}

/// Adjacent candle pair matching the opposite-candle break pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutCandidate {
    /// Position of `current` in the candle sequence (always >= 1).
    pub index: usize,
    pub previous: Candle,
    pub current: Candle,
    pub direction: BreakDirection,
}

/// A simulated long trade recorded in the ledger. Never edited once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    /// Calendar-day key (`YYYY-MM-DD`) of `entry_time` in the engine timezone.
    pub day: String,
    pub entry_time: i64,
    #[serde(deserialize_with = "nullable_price")]
    pub entry_price: f64,
    #[serde(deserialize_with = "nullable_price")]
    pub target_price: f64,
    /// Time of the first candle in the lookahead window that reached the target.
    pub target_hit_time: Option<i64>,
    /// `target_price - entry_price` when the target was hit, otherwise zero.
    #[serde(default, deserialize_with = "nullable_price")]
    pub realized_gain: f64,
}

/// JSON has no NaN; a non-finite price is written as `null` and read back as NaN.
fn nullable_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl SimulatedTrade {
    pub fn is_resolved(&self) -> bool {
        self.target_hit_time.is_some()
    }
}

/// User strategy settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategySettings {
    #[serde(default = "default_take_profit_percent")]
    pub take_profit_percent: f64,
    #[serde(default = "default_auto_support")]
    pub auto_support_enabled: bool,
}

pub const DEFAULT_TAKE_PROFIT_PERCENT: f64 = 4.0;

fn default_take_profit_percent() -> f64 {
    DEFAULT_TAKE_PROFIT_PERCENT
}

fn default_auto_support() -> bool {
    true
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            take_profit_percent: DEFAULT_TAKE_PROFIT_PERCENT,
            auto_support_enabled: true,
        }
    }
}

impl StrategySettings {
    /// Take-profit percent actually applied. Zero, negative and non-finite
    /// values fall back to the default so targets always sit above entry.
    pub fn effective_take_profit_percent(&self) -> f64 {
        if self.take_profit_percent.is_finite() && self.take_profit_percent > 0.0 {
            self.take_profit_percent
        } else {
            DEFAULT_TAKE_PROFIT_PERCENT
        }
    }
}

/// Reason a breakout candidate was not turned into a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    #[serde(rename = "pattern/consolidation")]
    Consolidation,
    #[serde(rename = "near manual S/R")]
    NearManualLevel,
    #[serde(rename = "near auto S/R")]
    NearAutoSupport,
    #[serde(rename = "small candle")]
    SmallCandle,
    #[serde(rename = "already recorded")]
    AlreadyRecorded,
    /// Entry falls on a day before the last candle's day.
    #[serde(rename = "previous day")]
    PreviousDay,
    /// Entry price or candle range is not a usable number.
    #[serde(rename = "invalid price")]
    InvalidPrice,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Consolidation => write!(f, "pattern/consolidation"),
            SkipReason::NearManualLevel => write!(f, "near manual S/R"),
            SkipReason::NearAutoSupport => write!(f, "near auto S/R"),
            SkipReason::SmallCandle => write!(f, "small candle"),
            SkipReason::AlreadyRecorded => write!(f, "already recorded"),
            SkipReason::PreviousDay => write!(f, "previous day"),
            SkipReason::InvalidPrice => write!(f, "invalid price"),
        }
    }
}

/// Planner decision for one evaluated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanResult {
    Skipped { index: usize, reason: SkipReason },
    Accepted { index: usize, trade: SimulatedTrade },
}

impl PlanResult {
    pub fn index(&self) -> usize {
        match self {
            PlanResult::Skipped { index, .. } | PlanResult::Accepted { index, .. } => *index,
        }
    }

    pub fn trade(&self) -> Option<&SimulatedTrade> {
        match self {
            PlanResult::Accepted { trade, .. } => Some(trade),
            PlanResult::Skipped { .. } => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            PlanResult::Skipped { reason, .. } => Some(*reason),
            PlanResult::Accepted { .. } => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PlanResult::Accepted { .. })
    }
}

/// Price levels in force for a pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportLevels {
    pub manual: Vec<Zone>,
    pub auto: Vec<f64>,
}

/// Directional lean of the momentum forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for Bias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bias::Bullish => write!(f, "bullish"),
            Bias::Bearish => write!(f, "bearish"),
            Bias::Neutral => write!(f, "neutral"),
        }
    }
}

/// Heuristic breakout probability. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutForecast {
    pub probability: f64,
    pub bias: Bias,
    pub reason: String,
}

/// Headline outcome of an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    InsufficientData,
    BuySignal,
    Consolidating,
    Waiting,
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStatus::InsufficientData => write!(f, "insufficient data"),
            SignalStatus::BuySignal => write!(f, "buy signal"),
            SignalStatus::Consolidating => write!(f, "consolidating"),
            SignalStatus::Waiting => write!(f, "waiting for break"),
        }
    }
}

/// Everything one evaluation pass decided, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    /// Day key of the last candle; `None` when there were no candles.
    pub day: Option<String>,
    pub candle_count: usize,
    pub consolidating: bool,
    pub levels: SupportLevels,
    pub candidates: Vec<BreakoutCandidate>,
    pub results: Vec<PlanResult>,
    pub trades_today: usize,
    pub day_profit: f64,
    pub status: SignalStatus,
    pub forecast: BreakoutForecast,
    /// Set when the candle input was rejected by strict validation.
    pub input_error: Option<String>,
}

impl PassReport {
    pub fn accepted(&self) -> impl Iterator<Item = &SimulatedTrade> {
        self.results.iter().filter_map(PlanResult::trade)
    }
}

/// Current state of the polling engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Stopped => write!(f, "stopped"),
            EngineState::Running => write!(f, "running"),
            EngineState::Paused => write!(f, "paused"),
        }
    }
}

/// Commands sent to the engine via the command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Stop,
    Pause,
    Resume,
    /// Run one pass immediately, outside the polling cadence.
    RunNow,
    /// Switch the chart granularity and run a pass immediately. The strategy
    /// keeps evaluating its own configured interval.
    SetInterval(crate::Interval),
}
