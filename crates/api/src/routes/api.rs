use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use common::{EngineCommand, Interval, StrategySettings, Zone};

use crate::{auth::require_auth, ApiError, AppState};

type ApiResult<T> = Result<T, ApiError>;

pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/report", get(get_report))
        .route("/api/trades", get(get_trades).delete(clear_trades))
        .route("/api/zones", get(get_zones).post(add_zone))
        .route("/api/zones/:index", delete(remove_zone))
        .route("/api/settings", get(get_settings).post(post_settings))
        .route("/api/engine/:command", post(engine_command))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

// ─── Report ───────────────────────────────────────────────────────────────────

async fn get_report(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "engine": state.engine.state().await,
        "interval": state.engine.interval().await,
        "strategy_interval": state.engine.strategy_interval(),
        "report": state.engine.latest_report().await,
    }))
}

// ─── Trades ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TradesQuery {
    day: Option<String>,
}

async fn get_trades(
    State(state): State<AppState>,
    Query(q): Query<TradesQuery>,
) -> ApiResult<Json<Value>> {
    let body = match q.day {
        Some(day) => {
            let trades = state.ledger.trades_for_day(&day).await?;
            let day_profit: f64 = trades.iter().map(|t| t.realized_gain).sum();
            json!({ "day": day, "count": trades.len(), "day_profit": day_profit, "trades": trades })
        }
        None => {
            let trades = state.ledger.all_trades().await?;
            json!({ "count": trades.len(), "trades": trades })
        }
    };
    Ok(Json(body))
}

async fn clear_trades(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.ledger.clear().await?;
    info!("Trade ledger cleared via API");
    Ok(Json(json!({ "status": "cleared" })))
}

// ─── Zones ────────────────────────────────────────────────────────────────────

async fn get_zones(State(state): State<AppState>) -> ApiResult<Json<Vec<Zone>>> {
    Ok(Json(state.zones.list().await?))
}

async fn add_zone(
    State(state): State<AppState>,
    Json(zone): Json<Zone>,
) -> ApiResult<(StatusCode, Json<Vec<Zone>>)> {
    if !zone.price.is_finite() || zone.price <= 0.0 {
        return Err(ApiError::BadRequest(format!(
            "zone price must be positive, got {}",
            zone.price
        )));
    }
    let zones = state.zones.add(zone).await?;
    Ok((StatusCode::CREATED, Json(zones)))
}

async fn remove_zone(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<Json<Zone>> {
    state
        .zones
        .remove(index)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no zone at index {index}")))
}

// ─── Settings ─────────────────────────────────────────────────────────────────

async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<StrategySettings>> {
    Ok(Json(state.settings.load().await?))
}

async fn post_settings(
    State(state): State<AppState>,
    Json(settings): Json<StrategySettings>,
) -> ApiResult<Json<StrategySettings>> {
    state.settings.save(&settings).await?;
    Ok(Json(settings))
}

// ─── Engine ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct EngineQuery {
    interval: Option<Interval>,
}

/// `start`, `stop`, `pause`, `resume`, `run`, or `interval?interval=1h`.
async fn engine_command(
    State(state): State<AppState>,
    Path(command): Path<String>,
    Query(q): Query<EngineQuery>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let cmd = match command.as_str() {
        "start" => EngineCommand::Start,
        "stop" => EngineCommand::Stop,
        "pause" => EngineCommand::Pause,
        "resume" => EngineCommand::Resume,
        "run" => EngineCommand::RunNow,
        "interval" => EngineCommand::SetInterval(q.interval.ok_or_else(|| {
            ApiError::BadRequest("missing 'interval' query parameter".to_string())
        })?),
        other => return Err(ApiError::NotFound(format!("unknown engine command '{other}'"))),
    };
    info!(command = ?cmd, "Engine command received via API");
    state.engine.send(cmd).await;
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted", "command": command }))))
}
