use axum::extract::State;
use axum::Json;
use futures::future::join_all;

use super::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once every configured symbol has at least one price.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let statuses = join_all(
        state
            .session
            .symbols()
            .iter()
            .map(|symbol| state.session.price_status(symbol)),
    )
    .await;
    let priced = statuses
        .iter()
        .filter(|s| matches!(s, Ok(status) if status.latest.is_some()))
        .count();
    let total = state.session.symbols().len();
    let status = if priced == total { "ready" } else { "warming" };

    Json(serde_json::json!({
        "status": status,
        "pricedSymbols": priced,
        "totalSymbols": total,
    }))
}
