//! Domain types for the paper trading desk.
//!
//! This module provides:
//! - Exact numeric handling via the Decimal wrapper
//! - Domain primitives: TimeMs, Symbol, Side, OrderType
//! - Trade records and price ticks

pub mod decimal;
pub mod primitives;
pub mod tick;
pub mod trade;

pub use decimal::Decimal;
pub use primitives::{OrderType, Side, Symbol, SymbolParseError, TimeMs};
pub use tick::PriceTick;
pub use trade::Trade;
