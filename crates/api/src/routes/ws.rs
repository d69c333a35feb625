use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use common::PassReport;

use crate::{auth::token_matches, AppState};

pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws/reports", get(ws_reports_handler))
}

#[derive(Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// WebSocket endpoint that streams pass reports to the dashboard as JSON text
/// frames. Auth via query param `?token=<DASHBOARD_TOKEN>` (header auth not
/// supported in browser WebSocket API).
async fn ws_reports_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(q): Query<WsQuery>,
) -> Response {
    let authed = q
        .token
        .as_deref()
        .map(|t| token_matches(t, &state.dashboard_token))
        .unwrap_or(false);

    if !authed {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    let latest = state.engine.latest_report().await;
    let report_rx = state.engine.subscribe_reports();
    ws.on_upgrade(move |socket| handle_ws(socket, latest, report_rx))
}

async fn handle_ws(
    mut socket: WebSocket,
    latest: Option<PassReport>,
    mut report_rx: broadcast::Receiver<PassReport>,
) {
    // Latest report first so a fresh client is not blank until the next pass
    if let Some(report) = latest {
        if !send_report(&mut socket, &report).await {
            return;
        }
    }

    loop {
        match report_rx.recv().await {
            Ok(report) => {
                if !send_report(&mut socket, &report).await {
                    break;
                }
            }
            Err(RecvError::Lagged(n)) => {
                warn!(dropped = n, "WebSocket report client lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("WebSocket report client disconnected");
}

async fn send_report(socket: &mut WebSocket, report: &PassReport) -> bool {
    match serde_json::to_string(report) {
        Ok(text) => socket.send(Message::Text(text)).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to encode pass report");
            true
        }
    }
}
