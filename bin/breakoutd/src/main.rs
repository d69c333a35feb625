use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{CandleSourceKind, Config, EngineCommand, KeyValueStore, StoreBackend};
use engine::{BinanceKlines, CandleSource, Engine, JsonFileSource, StrategyPass};
use ledger::{JsonFileStore, SqliteStore};
use strategy::StrategyFileConfig;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(
        timezone = %cfg.timezone.name(),
        interval = %cfg.strategy_interval,
        poll_secs = cfg.poll_interval.as_secs(),
        "Breakout engine starting"
    );

    let strategy_file = StrategyFileConfig::load_or_default(&cfg.strategy_config_path)
        .unwrap_or_else(|e| panic!("ERROR: {e}"));
    info!(
        path = %cfg.strategy_config_path,
        validation = ?strategy_file.candle_validation,
        daily_cap = strategy_file.planner.daily_cap,
        "Strategy config loaded"
    );

    // ── State store ───────────────────────────────────────────────────────────
    let store: Arc<dyn KeyValueStore> = match &cfg.store {
        StoreBackend::Sqlite(url) => Arc::new(
            SqliteStore::connect(url)
                .await
                .unwrap_or_else(|e| panic!("Failed to open state database: {e}")),
        ),
        StoreBackend::JsonFile(path) => {
            info!(path = %path, "Using JSON state file");
            Arc::new(JsonFileStore::new(path))
        }
    };

    // ── Candle source ─────────────────────────────────────────────────────────
    let source: Arc<dyn CandleSource> = match &cfg.candle_source {
        CandleSourceKind::Binance => Arc::new(
            BinanceKlines::new(cfg.timezone)
                .unwrap_or_else(|e| panic!("Failed to build HTTP client: {e}")),
        ),
        CandleSourceKind::JsonFile(path) => {
            info!(path = %path, "Reading candles from file");
            Arc::new(JsonFileSource::new(path))
        }
    };

    // ── Engine ────────────────────────────────────────────────────────────────
    let pass = StrategyPass::new(&strategy_file, cfg.timezone, store);
    let (engine, engine_handle) =
        Engine::new(pass.clone(), source, cfg.poll_interval, cfg.strategy_interval);

    // ── Dashboard API ─────────────────────────────────────────────────────────
    let api_state = api::AppState::new(engine_handle.clone(), &pass, cfg.dashboard_token.clone());

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    let port = cfg.dashboard_port;
    tokio::spawn(engine.run());
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            error!(error = %e, "Dashboard API stopped");
        }
    });
    engine_handle.send(EngineCommand::Start).await;

    info!("All subsystems started. Waiting for shutdown signal.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    engine_handle.send(EngineCommand::Stop).await;
    info!("Shutdown signal received. Exiting.");
}
