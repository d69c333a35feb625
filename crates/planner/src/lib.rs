pub mod planner;

pub use planner::{PlanInput, TradePlanner};
pub use strategy::PlannerConfig;
