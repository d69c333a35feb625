pub mod config;
pub mod day;
pub mod error;
pub mod interval;
pub mod store;
pub mod types;

pub use config::{CandleSourceKind, Config, StoreBackend};
pub use day::DayKeyResolver;
pub use error::{Error, Result};
pub use interval::Interval;
pub use store::KeyValueStore;
pub use types::*;
