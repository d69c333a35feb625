use std::time::Duration;

use crate::{DayKeyResolver, Interval};

/// Where persisted state (trades, zones, settings) lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// SQLite database URL, e.g. `sqlite://state/breakout.db`.
    Sqlite(String),
    /// Single JSON document on disk.
    JsonFile(String),
}

/// Where candles come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandleSourceKind {
    Binance,
    JsonFile(String),
}

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Dashboard
    pub dashboard_token: String,
    pub dashboard_port: u16,

    // Engine
    pub timezone: DayKeyResolver,
    pub poll_interval: Duration,
    pub strategy_interval: Interval,
    pub candle_source: CandleSourceKind,

    // Persistence
    pub store: StoreBackend,

    // Strategy config file path
    pub strategy_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing or invalid variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let timezone = DayKeyResolver::from_name(
            &optional_env("TIMEZONE").unwrap_or_else(|| "local".to_string()),
        )
        .unwrap_or_else(|e| panic!("ERROR: TIMEZONE is invalid: {e}"));

        let strategy_interval = optional_env("STRATEGY_INTERVAL")
            .map(|v| {
                v.parse::<Interval>()
                    .unwrap_or_else(|e| panic!("ERROR: STRATEGY_INTERVAL is invalid: {e}"))
            })
            .unwrap_or_default();

        let candle_source = match optional_env("CANDLE_SOURCE").as_deref() {
            None | Some("binance") => CandleSourceKind::Binance,
            Some(path) => CandleSourceKind::JsonFile(path.to_string()),
        };

        let store = match optional_env("DATABASE_URL") {
            Some(url) => StoreBackend::Sqlite(url),
            None => StoreBackend::JsonFile(
                optional_env("STATE_FILE").unwrap_or_else(|| "state/breakout.json".to_string()),
            ),
        };

        Config {
            dashboard_token: required_env("DASHBOARD_TOKEN"),
            dashboard_port: optional_env("DASHBOARD_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            timezone,
            poll_interval: Duration::from_secs(
                optional_env("POLL_INTERVAL_SECS")
                    .and_then(|v| v.parse().ok())
                    .filter(|&secs: &u64| secs > 0)
                    .unwrap_or(20),
            ),
            strategy_interval,
            candle_source,
            store,
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH")
                .unwrap_or_else(|| "config/strategy.toml".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
