//! Trade type representing a single executed fill.

use crate::domain::{Decimal, OrderType, Side, Symbol, TimeMs};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An executed fill. Trades are created by the ledger and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    /// Time the fill was applied, in milliseconds since Unix epoch.
    pub time_ms: TimeMs,
    pub symbol: Symbol,
    pub side: Side,
    /// Quantity actually filled (after any clamping).
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    /// Realized P&L produced by this fill; always zero for buys.
    pub realized_pnl: Decimal,
}

impl Trade {
    /// `price * quantity`, or `None` if it leaves the decimal range.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_serialization_skips_missing_order_type() {
        let trade = Trade {
            id: Uuid::nil(),
            time_ms: TimeMs::new(1000),
            symbol: Symbol::new("BTC-USD".to_string()),
            side: Side::Buy,
            quantity: Decimal::from_str_canonical("0.5").unwrap(),
            price: Decimal::from_str_canonical("68000").unwrap(),
            order_type: None,
            realized_pnl: Decimal::zero(),
        };

        let json = serde_json::to_value(&trade).unwrap();
        assert!(json.get("order_type").is_none());
        assert_eq!(json["side"], "BUY");
        assert_eq!(trade.notional(), Some(Decimal::from_str_canonical("34000").unwrap()));
    }
}
