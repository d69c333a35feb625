pub mod binance;
pub mod lifecycle;
pub mod pass;
pub mod source;

pub use binance::BinanceKlines;
pub use lifecycle::{Engine, EngineHandle};
pub use pass::StrategyPass;
pub use source::{CandleSource, JsonFileSource, StaticSource};
