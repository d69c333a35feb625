pub mod breakout;
pub mod config;
pub mod indicators;
pub mod normalize;
pub mod resample;

pub use breakout::scan_breakouts;
pub use config::{CandleValidation, PlannerConfig, StrategyConfigError, StrategyFileConfig};
pub use indicators::{
    cluster_lows, detect_supports, forecast, is_consolidating, ConsolidationDetector,
    SupportClusterer,
};
pub use normalize::{normalize, validate};
pub use resample::resample;

use common::{Candle, RawCandle, Result};

/// Turn raw records into candles according to the configured validation mode.
pub fn prepare_candles(records: &[RawCandle], mode: CandleValidation) -> Result<Vec<Candle>> {
    match mode {
        CandleValidation::Lenient => Ok(normalize(records)),
        CandleValidation::Strict => validate(records),
    }
}
