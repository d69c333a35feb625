pub mod consolidation;
pub mod momentum;
pub mod supports;

pub use consolidation::{is_consolidating, ConsolidationDetector};
pub use momentum::forecast;
pub use supports::{cluster_lows, detect_supports, SupportClusterer};
