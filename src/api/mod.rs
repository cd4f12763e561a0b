pub mod health;
pub mod instruments;
pub mod orders;
pub mod positions;
pub mod prices;
pub mod signal;
pub mod trades;

use crate::domain::Symbol;
use crate::error::AppError;
use crate::orchestration::TradingSession;
use axum::{
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<TradingSession>,
}

impl AppState {
    pub fn new(session: Arc<TradingSession>) -> Self {
        Self { session }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/instruments", get(instruments::get_instruments))
        .route("/v1/price", get(prices::get_price))
        .route("/v1/prices", get(prices::get_prices))
        .route("/v1/orders", post(orders::post_order))
        .route("/v1/position", get(positions::get_position))
        .route("/v1/position/reset-pnl", post(positions::reset_realized_pnl))
        .route("/v1/trades", get(trades::get_trades))
        .route("/v1/trades.csv", get(trades::get_trades_csv))
        .route("/v1/signal", get(signal::get_signal))
        .layer(cors)
        .with_state(state)
}

pub(crate) fn parse_symbol(input: &str) -> Result<Symbol, AppError> {
    Symbol::from_str(input).map_err(|_| AppError::BadRequest("Invalid symbol".to_string()))
}
