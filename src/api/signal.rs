use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use super::prices::SymbolQuery;
use super::{parse_symbol, AppState};
use crate::engine::{SignalDirection, SignalMethod};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResponse {
    pub symbol: String,
    pub direction: SignalDirection,
    pub method: SignalMethod,
    pub statistic: Option<String>,
    pub samples: usize,
    pub window: usize,
    pub insufficient_data: bool,
}

pub async fn get_signal(
    Query(params): Query<SymbolQuery>,
    State(state): State<AppState>,
) -> Result<Json<SignalResponse>, AppError> {
    let symbol = parse_symbol(&params.symbol)?;
    let signal = state.session.signal(&symbol).await?;

    Ok(Json(SignalResponse {
        symbol: symbol.as_str().to_string(),
        direction: signal.direction,
        method: signal.method,
        statistic: signal.statistic.map(|s| s.to_canonical_string()),
        samples: signal.samples,
        window: state.session.signal_window(),
        insufficient_data: signal.insufficient_data,
    }))
}
