//! Domain primitives: TimeMs, Symbol, Side, OrderType.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Wall-clock time at the moment of the call.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, saturating at zero.
    pub fn since(&self, earlier: TimeMs) -> i64 {
        self.0.saturating_sub(earlier.0).max(0)
    }
}

/// Instrument symbol, e.g. "BTC-USD".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid symbol: {0:?}")]
pub struct SymbolParseError(pub String);

impl Symbol {
    pub fn new(symbol: String) -> Self {
        Symbol(symbol)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = SymbolParseError;

    /// Symbols are upper-cased; only ASCII alphanumerics, '-' and '/' are allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= 32
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/');
        if !valid {
            return Err(SymbolParseError(s.to_string()));
        }
        Ok(Symbol(trimmed.to_ascii_uppercase()))
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade side. The desk only holds long positions, so Sell always reduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(format!("unknown side {}", other)),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// How the fill price of a manual order is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Fill at the current mark price.
    Market,
    /// Fill at the requested limit price.
    Limit,
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            other => Err(format!("unknown order type {}", other)),
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        let sell: Side = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(sell, Side::Sell);
    }

    #[test]
    fn test_side_from_str_is_case_insensitive() {
        assert_eq!(Side::from_str("buy").unwrap(), Side::Buy);
        assert_eq!(Side::from_str(" Sell ").unwrap(), Side::Sell);
        assert!(Side::from_str("short").is_err());
    }

    #[test]
    fn test_order_type_roundtrip() {
        assert_eq!(OrderType::from_str("limit").unwrap(), OrderType::Limit);
        assert_eq!(OrderType::Market.to_string(), "MARKET");
        assert!(OrderType::from_str("stop").is_err());
    }

    #[test]
    fn test_symbol_parse_normalizes_case() {
        assert_eq!(Symbol::from_str("btc-usd").unwrap().as_str(), "BTC-USD");
        assert_eq!(Symbol::from_str("ETH/USDT").unwrap().as_str(), "ETH/USDT");
        assert!(Symbol::from_str("").is_err());
        assert!(Symbol::from_str("BTC USD").is_err());
    }

    #[test]
    fn test_timems_since_saturates() {
        let t1 = TimeMs::new(1000);
        let t2 = TimeMs::new(2500);
        assert_eq!(t2.since(t1), 1500);
        assert_eq!(t1.since(t2), 0);
        assert!(t1 < t2);
    }
}
