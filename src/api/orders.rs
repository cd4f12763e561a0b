use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

use super::trades::TradeDto;
use super::{parse_symbol, AppState};
use crate::domain::{Decimal, OrderType, Side};
use crate::error::AppError;
use crate::intake::OrderRequest;

/// Order body. Quantities and prices are decimal strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    pub order_type: Option<String>,
    pub limit_price: Option<String>,
}

impl OrderBody {
    pub fn into_request(self) -> Result<OrderRequest, AppError> {
        let symbol = parse_symbol(&self.symbol)?;
        let side = Side::from_str(&self.side)
            .map_err(|_| AppError::BadRequest(format!("Invalid side: {}", self.side)))?;
        let order_type = match self.order_type.as_deref() {
            None | Some("") => OrderType::Market,
            Some(t) => OrderType::from_str(t)
                .map_err(|_| AppError::BadRequest(format!("Invalid order type: {}", t)))?,
        };
        let quantity = parse_decimal("quantity", &self.quantity)?;
        let limit_price = self
            .limit_price
            .as_deref()
            .map(|p| parse_decimal("limitPrice", p))
            .transpose()?;

        Ok(OrderRequest {
            symbol,
            side,
            quantity,
            order_type,
            limit_price,
        })
    }
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, AppError> {
    Decimal::from_str_canonical(value)
        .map_err(|_| AppError::BadRequest(format!("Invalid {}: {}", field, value)))
}

pub async fn post_order(
    State(state): State<AppState>,
    Json(body): Json<OrderBody>,
) -> Result<(StatusCode, Json<TradeDto>), AppError> {
    let request = body.into_request()?;
    let trade = state.session.submit_order(&request).await?;
    Ok((StatusCode::CREATED, Json(TradeDto::from(&trade))))
}
