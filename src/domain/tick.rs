use crate::domain::{Decimal, Symbol, TimeMs};
use serde::{Deserialize, Serialize};

/// A timestamped trade price for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: Symbol,
    pub time_ms: TimeMs,
    pub price: Decimal,
}

impl PriceTick {
    pub fn new(symbol: Symbol, time_ms: TimeMs, price: Decimal) -> Self {
        Self {
            symbol,
            time_ms,
            price,
        }
    }
}
