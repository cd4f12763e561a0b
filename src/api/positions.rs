use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use super::prices::SymbolQuery;
use super::{parse_symbol, AppState};
use crate::engine::LedgerSnapshot;
use crate::error::AppError;
use crate::orchestration::PositionReport;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub symbol: String,
    pub quantity: String,
    pub avg_entry: String,
    pub realized_pnl: String,
    pub trade_count: usize,
    pub mark_price: Option<String>,
    pub unrealized_pnl: Option<String>,
}

impl PositionResponse {
    fn from_snapshot(snapshot: &LedgerSnapshot) -> Self {
        PositionResponse {
            symbol: snapshot.symbol.as_str().to_string(),
            quantity: snapshot.quantity.to_canonical_string(),
            avg_entry: snapshot.avg_entry.to_canonical_string(),
            realized_pnl: snapshot.realized_pnl.to_canonical_string(),
            trade_count: snapshot.trade_count,
            mark_price: None,
            unrealized_pnl: None,
        }
    }
}

impl From<PositionReport> for PositionResponse {
    fn from(report: PositionReport) -> Self {
        PositionResponse {
            mark_price: report.mark_price.map(|p| p.to_canonical_string()),
            unrealized_pnl: report.unrealized_pnl.map(|p| p.to_canonical_string()),
            ..PositionResponse::from_snapshot(&report.snapshot)
        }
    }
}

pub async fn get_position(
    Query(params): Query<SymbolQuery>,
    State(state): State<AppState>,
) -> Result<Json<PositionResponse>, AppError> {
    let symbol = parse_symbol(&params.symbol)?;
    let report = state.session.position(&symbol).await?;
    Ok(Json(PositionResponse::from(report)))
}

/// Zero the realized P&L counter. Quantity, cost basis and trades are kept.
pub async fn reset_realized_pnl(
    Query(params): Query<SymbolQuery>,
    State(state): State<AppState>,
) -> Result<Json<PositionResponse>, AppError> {
    let symbol = parse_symbol(&params.symbol)?;
    let snapshot = state.session.reset_realized_pnl(&symbol).await?;
    Ok(Json(PositionResponse::from_snapshot(&snapshot)))
}
