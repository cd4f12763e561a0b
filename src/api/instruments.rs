use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::intake::TradingMode;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentsResponse {
    pub symbols: Vec<String>,
    pub trading_mode: TradingMode,
}

pub async fn get_instruments(State(state): State<AppState>) -> Json<InstrumentsResponse> {
    Json(InstrumentsResponse {
        symbols: state
            .session
            .symbols()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect(),
        trading_mode: state.session.intake().mode(),
    })
}
