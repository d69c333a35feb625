mod auth;
mod error;
pub mod routes;

use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::DayKeyResolver;
use engine::{EngineHandle, StrategyPass};
use ledger::{SettingsStore, TradeLedger, ZoneBook};

pub use error::ApiError;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub ledger: TradeLedger,
    pub zones: ZoneBook,
    pub settings: SettingsStore,
    pub days: DayKeyResolver,
    pub dashboard_token: String,
}

impl AppState {
    /// State sharing the pass's stores, so API edits are seen by the next pass.
    pub fn new(engine: EngineHandle, pass: &StrategyPass, dashboard_token: String) -> Self {
        Self {
            engine,
            ledger: pass.ledger().clone(),
            zones: pass.zones().clone(),
            settings: pass.settings().clone(),
            days: *pass.days(),
            dashboard_token,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::api_router(state.clone()))
        .merge(routes::ws_router())
        .merge(routes::health_router())
        .with_state(state)
        .layer(cors)
}

/// Build and run the Axum API server.
pub async fn serve(state: AppState, port: u16) -> common::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Dashboard API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
