use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::{consolidation, supports, ConsolidationDetector, SupportClusterer};

/// Strategy tuning file (TOML). Every section and key is optional.
///
/// Example `config/strategy.toml`:
/// ```toml
/// candle_validation = "strict"
///
/// [consolidation]
/// lookback = 8
/// threshold_percent = 0.7
///
/// [supports]
/// lookback = 36
/// cluster_tolerance_percent = 0.5
///
/// [planner]
/// daily_cap = 2
/// proximity_percent = 0.6
/// min_range_percent = 0.2
/// lookahead = 12
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyFileConfig {
    pub candle_validation: CandleValidation,
    pub consolidation: ConsolidationConfig,
    pub supports: SupportsConfig,
    pub planner: PlannerConfig,
}

#[derive(Debug, Error)]
pub enum StrategyConfigError {
    #[error("failed to read strategy config at '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse strategy config at '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

impl StrategyFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self, StrategyConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| StrategyConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| StrategyConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Load from a TOML file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &str) -> Result<Self, StrategyConfigError> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// How candle records with non-numeric fields are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleValidation {
    /// Coerce bad fields to 0/NaN and carry on.
    #[default]
    Lenient,
    /// Reject the whole candle set on the first malformed record.
    Strict,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    pub lookback: usize,
    pub threshold_percent: f64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            lookback: consolidation::DEFAULT_LOOKBACK,
            threshold_percent: consolidation::DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

impl ConsolidationConfig {
    pub fn detector(&self) -> ConsolidationDetector {
        ConsolidationDetector::new(self.lookback, self.threshold_percent)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SupportsConfig {
    pub lookback: usize,
    pub cluster_tolerance_percent: f64,
}

impl Default for SupportsConfig {
    fn default() -> Self {
        Self {
            lookback: supports::DEFAULT_LOOKBACK,
            cluster_tolerance_percent: supports::DEFAULT_CLUSTER_TOLERANCE_PERCENT,
        }
    }
}

impl SupportsConfig {
    pub fn clusterer(&self) -> SupportClusterer {
        SupportClusterer::new(self.lookback, self.cluster_tolerance_percent)
    }
}

/// Trade planner constants.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Maximum trades recorded per calendar day.
    pub daily_cap: usize,
    /// Entry within this percent of a level is vetoed.
    pub proximity_percent: f64,
    /// Candles whose high-low range is below this percent of open are vetoed.
    pub min_range_percent: f64,
    /// Number of candles after entry searched for the take-profit.
    pub lookahead: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            daily_cap: 2,
            proximity_percent: 0.6,
            min_range_percent: 0.2,
            lookahead: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg: StrategyFileConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.candle_validation, CandleValidation::Lenient);
        assert_eq!(cfg.consolidation.lookback, 8);
        assert_eq!(cfg.supports.lookback, 36);
        assert_eq!(cfg.planner.daily_cap, 2);
        assert_eq!(cfg.planner.lookahead, 12);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: StrategyFileConfig = toml::from_str(
            r#"
            candle_validation = "strict"
            [planner]
            daily_cap = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.candle_validation, CandleValidation::Strict);
        assert_eq!(cfg.planner.daily_cap, 3);
        assert_eq!(cfg.planner.proximity_percent, 0.6);
        assert_eq!(cfg.consolidation.threshold_percent, 0.7);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let cfg = StrategyFileConfig::load_or_default("does/not/exist.toml").unwrap();
        assert_eq!(cfg.supports.cluster_tolerance_percent, 0.5);
    }

    #[test]
    fn missing_file_is_read_error_for_load() {
        assert!(matches!(
            StrategyFileConfig::load("does/not/exist.toml"),
            Err(StrategyConfigError::Read { .. })
        ));
    }
}
