use common::Candle;

pub const DEFAULT_LOOKBACK: usize = 8;
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 0.7;

/// Range-bound regime detector.
///
/// The last `lookback` candles are consolidating when their total excursion
/// (`max(high) - min(low)`) is at most `threshold_percent` of their mean close.
#[derive(Debug, Clone)]
pub struct ConsolidationDetector {
    pub lookback: usize,
    pub threshold_percent: f64,
}

impl Default for ConsolidationDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK, DEFAULT_THRESHOLD_PERCENT)
    }
}

impl ConsolidationDetector {
    pub fn new(lookback: usize, threshold_percent: f64) -> Self {
        Self {
            lookback,
            threshold_percent,
        }
    }

    /// Classify the most recent window. Too few candles is never consolidating.
    pub fn is_consolidating(&self, candles: &[Candle]) -> bool {
        is_consolidating(candles, self.lookback, self.threshold_percent)
    }
}

/// See [`ConsolidationDetector`]. A zero or NaN threshold means the default.
pub fn is_consolidating(candles: &[Candle], lookback: usize, threshold_percent: f64) -> bool {
    if lookback == 0 || candles.len() < lookback {
        return false;
    }
    let window = &candles[candles.len() - lookback..];

    let high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let avg_close = window.iter().map(|c| c.close).sum::<f64>() / window.len() as f64;
    if avg_close == 0.0 || !avg_close.is_finite() {
        return false;
    }

    let threshold = if threshold_percent == 0.0 || threshold_percent.is_nan() {
        DEFAULT_THRESHOLD_PERCENT / 100.0
    } else {
        threshold_percent / 100.0
    };
    (high - low) / avg_close <= threshold
}
