use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{parse_symbol, AppState};
use crate::error::AppError;

const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct PricesQuery {
    pub symbol: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub symbol: String,
    pub price: Option<String>,
    pub time_ms: Option<i64>,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePointDto {
    pub time_ms: i64,
    pub price: String,
}

#[derive(Debug, Serialize)]
pub struct PricesResponse {
    pub symbol: String,
    pub prices: Vec<PricePointDto>,
}

pub async fn get_price(
    Query(params): Query<SymbolQuery>,
    State(state): State<AppState>,
) -> Result<Json<PriceResponse>, AppError> {
    let symbol = parse_symbol(&params.symbol)?;
    let status = state.session.price_status(&symbol).await?;

    Ok(Json(PriceResponse {
        symbol: symbol.as_str().to_string(),
        price: status.latest.as_ref().map(|t| t.price.to_canonical_string()),
        time_ms: status.latest.as_ref().map(|t| t.time_ms.as_ms()),
        stale: status.stale,
        last_error: status.last_error,
    }))
}

/// Recent price history, oldest first.
pub async fn get_prices(
    Query(params): Query<PricesQuery>,
    State(state): State<AppState>,
) -> Result<Json<PricesResponse>, AppError> {
    let symbol = parse_symbol(&params.symbol)?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    let prices = state
        .session
        .recent_prices(&symbol, limit)
        .await?
        .into_iter()
        .map(|t| PricePointDto {
            time_ms: t.time_ms.as_ms(),
            price: t.price.to_canonical_string(),
        })
        .collect();

    Ok(Json(PricesResponse {
        symbol: symbol.as_str().to_string(),
        prices,
    }))
}
