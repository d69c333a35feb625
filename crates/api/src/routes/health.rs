use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Health check endpoint. No auth required.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "engine": state.engine.state().await.to_string(),
        "interval": state.engine.interval().await,
        "strategy_interval": state.engine.strategy_interval(),
        "timezone": state.days.name(),
    }))
}
