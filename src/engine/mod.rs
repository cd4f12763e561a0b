//! Pure, synchronous trading logic: ledger, trade log and signal heuristic.

pub mod ledger;
pub mod signal;
pub mod trade_log;

pub use ledger::{
    CostBasisMethod, LedgerError, LedgerSettings, LedgerSnapshot, OversellPolicy,
    PositionLedger, PositionState,
};
pub use signal::{Signal, SignalDirection, SignalHeuristic, SignalMethod};
pub use trade_log::{write_trades_csv, TradeLog};
