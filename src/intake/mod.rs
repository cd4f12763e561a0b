//! Order intake: turns a manual order request into a fill on a ledger.
//!
//! Orders fill immediately. There is no book, so a limit order fills at its
//! limit price whether or not it is marketable.

use crate::domain::{Decimal, OrderType, Side, Symbol, Trade};
use crate::engine::{LedgerError, PositionLedger};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Whether submitted orders are filled against the paper ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    #[default]
    Simulation,
    /// No exchange connector exists; every order is refused.
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub limit_price: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(symbol: Symbol, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol,
            side,
            quantity,
            order_type: OrderType::Market,
            limit_price: None,
        }
    }

    pub fn limit(symbol: Symbol, side: Side, quantity: Decimal, limit_price: Decimal) -> Self {
        Self {
            symbol,
            side,
            quantity,
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("limit order requires a limit price")]
    MissingLimitPrice,
    #[error("no mark price available for {0}")]
    NoMarkPrice(Symbol),
    #[error("order for {order} routed to the {ledger} ledger")]
    SymbolMismatch { order: Symbol, ledger: Symbol },
    #[error("live trading is not supported; switch to simulation mode")]
    LiveTradingUnsupported,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderIntake {
    mode: TradingMode,
}

impl OrderIntake {
    pub fn new(mode: TradingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> TradingMode {
        self.mode
    }

    /// Resolve the fill price for `request` given the current mark.
    pub fn fill_price(
        &self,
        request: &OrderRequest,
        mark_price: Option<Decimal>,
    ) -> Result<Decimal, IntakeError> {
        match request.order_type {
            OrderType::Market => {
                mark_price.ok_or_else(|| IntakeError::NoMarkPrice(request.symbol.clone()))
            }
            OrderType::Limit => request.limit_price.ok_or(IntakeError::MissingLimitPrice),
        }
    }

    /// Fill `request` on `ledger`. Ledger errors are returned unchanged.
    pub fn submit(
        &self,
        ledger: &mut PositionLedger,
        request: &OrderRequest,
        mark_price: Option<Decimal>,
    ) -> Result<Trade, IntakeError> {
        if self.mode == TradingMode::Live {
            return Err(IntakeError::LiveTradingUnsupported);
        }
        if ledger.symbol() != &request.symbol {
            return Err(IntakeError::SymbolMismatch {
                order: request.symbol.clone(),
                ledger: ledger.symbol().clone(),
            });
        }

        let price = self.fill_price(request, mark_price)?;
        let trade =
            ledger.apply_order_fill(request.side, request.quantity, price, request.order_type)?;

        info!(
            "Filled {} {} {} {} @ {}",
            trade.order_type.unwrap_or(request.order_type),
            trade.side,
            trade.quantity,
            trade.symbol,
            trade.price
        );
        Ok(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn btc() -> Symbol {
        Symbol::new("BTC-USD".to_string())
    }

    #[test]
    fn test_market_fills_at_mark() {
        let intake = OrderIntake::default();
        let mut ledger = PositionLedger::new(btc());
        let request = OrderRequest::market(btc(), Side::Buy, d("0.25"));

        let trade = intake.submit(&mut ledger, &request, Some(d("68012.34"))).unwrap();
        assert_eq!(trade.price, d("68012.34"));
        assert_eq!(trade.order_type, Some(OrderType::Market));
        assert_eq!(ledger.avg_entry(), d("68012.34"));
    }

    #[test]
    fn test_limit_fills_at_limit_even_if_not_marketable() {
        let intake = OrderIntake::default();
        let mut ledger = PositionLedger::new(btc());
        let request = OrderRequest::limit(btc(), Side::Buy, d("1"), d("60000"));

        let trade = intake.submit(&mut ledger, &request, Some(d("68000"))).unwrap();
        assert_eq!(trade.price, d("60000"));
        assert_eq!(trade.order_type, Some(OrderType::Limit));
    }

    #[test]
    fn test_market_without_mark_is_rejected() {
        let intake = OrderIntake::default();
        let mut ledger = PositionLedger::new(btc());
        let request = OrderRequest::market(btc(), Side::Buy, d("1"));

        assert_eq!(
            intake.submit(&mut ledger, &request, None),
            Err(IntakeError::NoMarkPrice(btc()))
        );
        assert!(ledger.trades().is_empty());
    }

    #[test]
    fn test_limit_without_price_is_rejected() {
        let intake = OrderIntake::default();
        let mut ledger = PositionLedger::new(btc());
        let mut request = OrderRequest::market(btc(), Side::Buy, d("1"));
        request.order_type = OrderType::Limit;

        assert_eq!(
            intake.submit(&mut ledger, &request, Some(d("100"))),
            Err(IntakeError::MissingLimitPrice)
        );
    }

    #[test]
    fn test_ledger_errors_propagate() {
        let intake = OrderIntake::default();
        let mut ledger = PositionLedger::new(btc());

        let zero_qty = OrderRequest::market(btc(), Side::Buy, Decimal::zero());
        assert!(matches!(
            intake.submit(&mut ledger, &zero_qty, Some(d("100"))),
            Err(IntakeError::Ledger(LedgerError::InvalidTrade(_)))
        ));

        let oversell = OrderRequest::market(btc(), Side::Sell, d("1"));
        assert!(matches!(
            intake.submit(&mut ledger, &oversell, Some(d("100"))),
            Err(IntakeError::Ledger(LedgerError::Position { .. }))
        ));
    }

    #[test]
    fn test_live_mode_refuses_everything() {
        let intake = OrderIntake::new(TradingMode::Live);
        let mut ledger = PositionLedger::new(btc());
        let request = OrderRequest::limit(btc(), Side::Buy, d("1"), d("100"));

        assert_eq!(
            intake.submit(&mut ledger, &request, Some(d("100"))),
            Err(IntakeError::LiveTradingUnsupported)
        );
        assert!(ledger.trades().is_empty());
    }

    #[test]
    fn test_symbol_mismatch() {
        let intake = OrderIntake::default();
        let mut ledger = PositionLedger::new(btc());
        let request = OrderRequest::market(Symbol::new("ETH-USD".to_string()), Side::Buy, d("1"));

        assert!(matches!(
            intake.submit(&mut ledger, &request, Some(d("3000"))),
            Err(IntakeError::SymbolMismatch { .. })
        ));
    }
}
