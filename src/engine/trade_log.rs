//! Append-only chronological record of executed trades.

use crate::domain::Trade;
use serde::Serialize;
use std::io;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeLog {
    trades: Vec<Trade>,
}

/// One CSV row; decimals are written in canonical form.
#[derive(Debug, Serialize)]
struct TradeCsvRow<'a> {
    id: String,
    time_ms: i64,
    symbol: &'a str,
    side: String,
    order_type: String,
    quantity: String,
    price: String,
    realized_pnl: String,
}

impl<'a> From<&'a Trade> for TradeCsvRow<'a> {
    fn from(trade: &'a Trade) -> Self {
        TradeCsvRow {
            id: trade.id.to_string(),
            time_ms: trade.time_ms.as_ms(),
            symbol: trade.symbol.as_str(),
            side: trade.side.to_string(),
            order_type: trade
                .order_type
                .map(|t| t.to_string())
                .unwrap_or_default(),
            quantity: trade.quantity.to_canonical_string(),
            price: trade.price.to_canonical_string(),
            realized_pnl: trade.realized_pnl.to_canonical_string(),
        }
    }
}

impl TradeLog {
    pub fn new() -> Self {
        Self { trades: Vec::new() }
    }

    /// Only the ledger appends, so insertion order is application order.
    pub(crate) fn append(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn all(&self) -> &[Trade] {
        &self.trades
    }

    /// The last `n` trades, oldest first.
    pub fn recent(&self, n: usize) -> &[Trade] {
        let start = self.trades.len().saturating_sub(n);
        &self.trades[start..]
    }

    pub fn last(&self) -> Option<&Trade> {
        self.trades.last()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Write the full log as CSV with a header row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_trades_csv(&self.trades, writer)
    }
}

/// Write `trades` as CSV with a header row.
pub fn write_trades_csv<W: io::Write>(trades: &[Trade], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for trade in trades {
        wtr.serialize(TradeCsvRow::from(trade))?;
    }
    wtr.flush()?;
    Ok(())
}
