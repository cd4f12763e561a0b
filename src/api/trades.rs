use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::prices::SymbolQuery;
use super::{parse_symbol, AppState};
use crate::domain::Trade;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct TradesQuery {
    pub symbol: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TradesResponse {
    pub trades: Vec<TradeDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDto {
    pub id: String,
    pub time_ms: i64,
    pub symbol: String,
    pub side: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
    pub quantity: String,
    pub price: String,
    pub realized_pnl: String,
}

impl From<&Trade> for TradeDto {
    fn from(trade: &Trade) -> Self {
        TradeDto {
            id: trade.id.to_string(),
            time_ms: trade.time_ms.as_ms(),
            symbol: trade.symbol.as_str().to_string(),
            side: trade.side.to_string(),
            order_type: trade.order_type.map(|t| t.to_string()),
            quantity: trade.quantity.to_canonical_string(),
            price: trade.price.to_canonical_string(),
            realized_pnl: trade.realized_pnl.to_canonical_string(),
        }
    }
}

pub async fn get_trades(
    Query(params): Query<TradesQuery>,
    State(state): State<AppState>,
) -> Result<Json<TradesResponse>, AppError> {
    let symbol = parse_symbol(&params.symbol)?;
    let trades = state.session.trades(&symbol, params.limit).await?;

    Ok(Json(TradesResponse {
        trades: trades.iter().map(TradeDto::from).collect(),
    }))
}

pub async fn get_trades_csv(
    Query(params): Query<SymbolQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let symbol = parse_symbol(&params.symbol)?;
    let body = state.session.trades_csv(&symbol).await?;

    let disposition = format!(
        "attachment; filename=\"trades-{}.csv\"",
        symbol.as_str().replace('/', "-")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
