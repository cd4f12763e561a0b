use crate::domain::{Decimal, OrderType, Side, Symbol, TimeMs, Trade};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::TradeLog;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid trade: {0}")]
    InvalidTrade(String),
    #[error("invalid mark price {0}: must be > 0")]
    InvalidPrice(Decimal),
    #[error("cannot sell {requested}: position holds {available}")]
    Position {
        requested: Decimal,
        available: Decimal,
    },
}

/// What to do with a sell larger than the held quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversellPolicy {
    /// Fail with [`LedgerError::Position`] and leave the ledger untouched.
    #[default]
    Reject,
    /// Close the held quantity and drop the excess.
    Clamp,
}

/// How realized P&L is measured against the cost of the held position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostBasisMethod {
    #[default]
    WeightedAverage,
    /// Sells consume the oldest open lots first.
    Fifo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerSettings {
    pub oversell: OversellPolicy,
    pub cost_basis: CostBasisMethod,
}

/// Current state of the long position for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionState {
    /// Units held; never negative.
    pub quantity: Decimal,

    /// Average entry price (zero whenever quantity is zero).
    pub avg_entry: Decimal,

    /// Aggregate cost of the held units. `avg_entry = cost / quantity`.
    cost: Decimal,
}

impl PositionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }
}

/// Read-only view of a ledger for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub avg_entry: Decimal,
    pub realized_pnl: Decimal,
    pub trade_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Lot {
    quantity: Decimal,
    price: Decimal,
}

/// How a planned fill changes the FIFO lot queue.
#[derive(Debug)]
enum LotChange {
    Push(Lot),
    Consume { full: usize, partial: Decimal },
}

/// A fully computed fill, committed only after every check passed.
#[derive(Debug)]
struct Plan {
    filled: Decimal,
    realized: Decimal,
    state: PositionState,
    lots: Option<LotChange>,
}

/// Position, cost basis and realized P&L for a single instrument.
///
/// Every mutation goes through [`PositionLedger::apply_trade`] or
/// [`PositionLedger::apply_order_fill`]; a failed call leaves all state untouched.
#[derive(Debug, Clone)]
pub struct PositionLedger {
    symbol: Symbol,
    settings: LedgerSettings,
    state: PositionState,
    lots: VecDeque<Lot>,
    realized_pnl: Decimal,
    log: TradeLog,
}

impl PositionLedger {
    pub fn new(symbol: Symbol) -> Self {
        Self::with_settings(symbol, LedgerSettings::default())
    }

    pub fn with_settings(symbol: Symbol, settings: LedgerSettings) -> Self {
        Self {
            symbol,
            settings,
            state: PositionState::new(),
            lots: VecDeque::new(),
            realized_pnl: Decimal::zero(),
            log: TradeLog::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn settings(&self) -> LedgerSettings {
        self.settings
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn quantity(&self) -> Decimal {
        self.state.quantity
    }

    pub fn avg_entry(&self) -> Decimal {
        self.state.avg_entry
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn trades(&self) -> &TradeLog {
        &self.log
    }

    /// Apply an untagged fill at `price`.
    pub fn apply_trade(
        &mut self,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Trade, LedgerError> {
        self.apply(side, quantity, price, None, None)
    }

    /// Apply a fill produced by order intake, tagging the trade with its order type.
    pub fn apply_order_fill(
        &mut self,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        order_type: OrderType,
    ) -> Result<Trade, LedgerError> {
        self.apply(side, quantity, price, Some(order_type), None)
    }

    /// Replay previously recorded trades, oldest first, keeping their ids and timestamps.
    ///
    /// All or nothing: if any trade is rejected the ledger is left as it was.
    pub fn restore(&mut self, trades: &[Trade]) -> Result<usize, LedgerError> {
        self.restore_with_resets(trades, &[])
    }

    /// Like [`PositionLedger::restore`], also replaying realized P&L resets.
    ///
    /// Each entry of `resets` is the number of `trades` that had been applied
    /// when the reset happened. Entries past the end apply after the last trade.
    pub fn restore_with_resets(
        &mut self,
        trades: &[Trade],
        resets: &[usize],
    ) -> Result<usize, LedgerError> {
        let mut replay = self.clone();
        let mut resets = resets.iter().copied().peekable();

        for (applied, trade) in trades.iter().enumerate() {
            while resets.next_if(|&at| at <= applied).is_some() {
                replay.reset_realized_pnl();
            }
            if trade.symbol != replay.symbol {
                return Err(LedgerError::InvalidTrade(format!(
                    "trade {} belongs to {}, not {}",
                    trade.id, trade.symbol, replay.symbol
                )));
            }
            replay.apply(
                trade.side,
                trade.quantity,
                trade.price,
                trade.order_type,
                Some((trade.id, trade.time_ms)),
            )?;
        }
        if resets.next().is_some() {
            replay.reset_realized_pnl();
        }

        *self = replay;
        Ok(trades.len())
    }

    /// Paper P&L of the open position at `mark_price`.
    pub fn unrealized_pnl(&self, mark_price: Decimal) -> Result<Decimal, LedgerError> {
        if !mark_price.is_positive() {
            return Err(LedgerError::InvalidPrice(mark_price));
        }
        if self.state.is_flat() {
            return Ok(Decimal::zero());
        }
        let pnl = match self.settings.cost_basis {
            CostBasisMethod::WeightedAverage => (mark_price - self.state.avg_entry)
                .checked_mul(self.state.quantity),
            // Lot costs are exact; the reported average may carry a rounded tail.
            CostBasisMethod::Fifo => mark_price
                .checked_mul(self.state.quantity)
                .and_then(|value| value.checked_sub(self.state.cost)),
        };
        pnl.ok_or_else(|| overflow("unrealized P&L"))
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            symbol: self.symbol.clone(),
            quantity: self.state.quantity,
            avg_entry: self.state.avg_entry,
            realized_pnl: self.realized_pnl,
            trade_count: self.log.len(),
        }
    }

    /// Zero the realized P&L accumulator. Position and trade log are kept.
    pub fn reset_realized_pnl(&mut self) {
        self.realized_pnl = Decimal::zero();
    }

    fn apply(
        &mut self,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        order_type: Option<OrderType>,
        stamp: Option<(Uuid, TimeMs)>,
    ) -> Result<Trade, LedgerError> {
        if !quantity.is_positive() {
            return Err(LedgerError::InvalidTrade(format!(
                "quantity must be > 0, got {}",
                quantity
            )));
        }
        if !price.is_positive() {
            return Err(LedgerError::InvalidTrade(format!(
                "price must be > 0, got {}",
                price
            )));
        }

        let plan = match side {
            Side::Buy => self.plan_buy(quantity, price)?,
            Side::Sell => self.plan_sell(quantity, price)?,
        };
        let realized_total = self
            .realized_pnl
            .checked_add(plan.realized)
            .ok_or_else(|| overflow("realized P&L"))?;

        let (id, time_ms) = stamp.unwrap_or_else(|| (Uuid::new_v4(), TimeMs::now()));
        let trade = Trade {
            id,
            time_ms,
            symbol: self.symbol.clone(),
            side,
            quantity: plan.filled,
            price,
            order_type,
            realized_pnl: plan.realized,
        };

        self.commit(plan, realized_total);
        self.log.append(trade.clone());

        debug!(
            "{} {} {} @ {}: qty={} avg={} realized={}",
            self.symbol,
            side,
            trade.quantity,
            price,
            self.state.quantity,
            self.state.avg_entry,
            self.realized_pnl
        );

        Ok(trade)
    }

    fn plan_buy(&self, quantity: Decimal, price: Decimal) -> Result<Plan, LedgerError> {
        let new_qty = self
            .state
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| overflow("position quantity"))?;
        let new_cost = price
            .checked_mul(quantity)
            .and_then(|notional| self.state.cost.checked_add(notional))
            .ok_or_else(|| overflow("position cost"))?;
        let avg_entry = new_cost
            .checked_div(new_qty)
            .ok_or_else(|| overflow("average entry"))?;

        let lots = match self.settings.cost_basis {
            CostBasisMethod::WeightedAverage => None,
            CostBasisMethod::Fifo => Some(LotChange::Push(Lot { quantity, price })),
        };

        Ok(Plan {
            filled: quantity,
            realized: Decimal::zero(),
            state: PositionState {
                quantity: new_qty,
                avg_entry,
                cost: new_cost,
            },
            lots,
        })
    }

    fn plan_sell(&self, quantity: Decimal, price: Decimal) -> Result<Plan, LedgerError> {
        let held = self.state.quantity;
        let oversold = quantity > held;
        if held.is_zero() || (oversold && self.settings.oversell == OversellPolicy::Reject) {
            return Err(LedgerError::Position {
                requested: quantity,
                available: held,
            });
        }

        let closed = quantity.min(held);
        if oversold {
            warn!(
                "{}: sell of {} clamped to held quantity {}",
                self.symbol, quantity, closed
            );
        }
        let remaining = held - closed;

        let (realized, new_cost, lots) = match self.settings.cost_basis {
            CostBasisMethod::WeightedAverage => {
                let realized = (price - self.state.avg_entry)
                    .checked_mul(closed)
                    .ok_or_else(|| overflow("realized P&L"))?;
                // cost_after + avg_entry * closed == cost_before, exactly.
                let relieved = self
                    .state
                    .avg_entry
                    .checked_mul(closed)
                    .ok_or_else(|| overflow("position cost"))?;
                (realized, self.state.cost - relieved, None)
            }
            CostBasisMethod::Fifo => {
                let (realized, consumed_cost, change) = self.consume_lots(closed, price)?;
                (realized, self.state.cost - consumed_cost, Some(change))
            }
        };

        let state = if remaining.is_zero() {
            PositionState::new()
        } else {
            let avg_entry = match self.settings.cost_basis {
                CostBasisMethod::WeightedAverage => self.state.avg_entry,
                CostBasisMethod::Fifo => new_cost
                    .checked_div(remaining)
                    .ok_or_else(|| overflow("average entry"))?,
            };
            PositionState {
                quantity: remaining,
                avg_entry,
                cost: new_cost,
            }
        };

        Ok(Plan {
            filled: closed,
            realized,
            state,
            lots,
        })
    }

    /// Walk the lot queue oldest-first without mutating it.
    /// Returns (realized P&L, cost of consumed units, queue change).
    fn consume_lots(
        &self,
        mut to_close: Decimal,
        price: Decimal,
    ) -> Result<(Decimal, Decimal, LotChange), LedgerError> {
        let mut realized = Decimal::zero();
        let mut consumed_cost = Decimal::zero();
        let mut full = 0;
        let mut partial = Decimal::zero();

        for lot in &self.lots {
            if to_close.is_zero() {
                break;
            }
            let take = to_close.min(lot.quantity);
            realized = (price - lot.price)
                .checked_mul(take)
                .and_then(|pnl| realized.checked_add(pnl))
                .ok_or_else(|| overflow("realized P&L"))?;
            consumed_cost = lot
                .price
                .checked_mul(take)
                .and_then(|cost| consumed_cost.checked_add(cost))
                .ok_or_else(|| overflow("position cost"))?;
            to_close -= take;
            if take == lot.quantity {
                full += 1;
            } else {
                partial = take;
            }
        }

        Ok((realized, consumed_cost, LotChange::Consume { full, partial }))
    }

    fn commit(&mut self, plan: Plan, realized_total: Decimal) {
        match plan.lots {
            Some(LotChange::Push(lot)) => self.lots.push_back(lot),
            Some(LotChange::Consume { full, partial }) => {
                self.lots.drain(..full);
                if partial.is_positive() {
                    if let Some(front) = self.lots.front_mut() {
                        front.quantity -= partial;
                    }
                }
            }
            None => {}
        }
        if plan.state.is_flat() {
            self.lots.clear();
        }
        self.state = plan.state;
        self.realized_pnl = realized_total;
    }
}

fn overflow(what: &str) -> LedgerError {
    LedgerError::InvalidTrade(format!("{} overflows the decimal range", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn ledger() -> PositionLedger {
        PositionLedger::new(Symbol::new("BTC-USD".to_string()))
    }

    fn fifo_ledger() -> PositionLedger {
        PositionLedger::with_settings(
            Symbol::new("BTC-USD".to_string()),
            LedgerSettings {
                oversell: OversellPolicy::Reject,
                cost_basis: CostBasisMethod::Fifo,
            },
        )
    }

    #[test]
    fn test_buy_from_flat_sets_entry() {
        let mut ledger = ledger();
        let trade = ledger.apply_trade(Side::Buy, d("1.5"), d("68000")).unwrap();

        assert_eq!(ledger.quantity(), d("1.5"));
        assert_eq!(ledger.avg_entry(), d("68000"));
        assert_eq!(trade.quantity, d("1.5"));
        assert_eq!(trade.realized_pnl, Decimal::zero());
        assert_eq!(trade.order_type, None);
    }

    #[test]
    fn test_order_fill_is_tagged() {
        let mut ledger = ledger();
        let trade = ledger
            .apply_order_fill(Side::Buy, d("1"), d("100"), OrderType::Limit)
            .unwrap();
        assert_eq!(trade.order_type, Some(OrderType::Limit));
        assert_eq!(ledger.trades().all()[0], trade);
    }

    #[test]
    fn test_sell_with_nothing_held_is_position_error() {
        let mut ledger = ledger();
        let err = ledger.apply_trade(Side::Sell, d("1"), d("100")).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Position {
                requested: d("1"),
                available: Decimal::zero(),
            }
        );
        assert!(ledger.trades().is_empty());
    }

    #[test]
    fn test_clamp_policy_closes_held_quantity() {
        let mut ledger = PositionLedger::with_settings(
            Symbol::new("BTC-USD".to_string()),
            LedgerSettings {
                oversell: OversellPolicy::Clamp,
                cost_basis: CostBasisMethod::WeightedAverage,
            },
        );
        ledger.apply_trade(Side::Buy, d("2"), d("100")).unwrap();

        let trade = ledger.apply_trade(Side::Sell, d("5"), d("110")).unwrap();
        assert_eq!(trade.quantity, d("2"));
        assert_eq!(trade.realized_pnl, d("20"));
        assert!(ledger.state().is_flat());
        assert_eq!(ledger.avg_entry(), Decimal::zero());

        // Clamping never opens a short; a second sell has nothing to close.
        assert!(matches!(
            ledger.apply_trade(Side::Sell, d("1"), d("110")),
            Err(LedgerError::Position { .. })
        ));
    }

    #[test]
    fn test_fifo_realizes_oldest_lot_first() {
        let mut ledger = fifo_ledger();
        ledger.apply_trade(Side::Buy, d("10"), d("100")).unwrap();
        ledger.apply_trade(Side::Buy, d("10"), d("110")).unwrap();

        let trade = ledger.apply_trade(Side::Sell, d("5"), d("120")).unwrap();
        assert_eq!(trade.realized_pnl, d("100"));
        assert_eq!(ledger.quantity(), d("15"));
        // Remaining lots: 5 @ 100, 10 @ 110.
        assert_eq!(ledger.avg_entry(), d("1600") / d("15"));
        assert_eq!(ledger.unrealized_pnl(d("115")).unwrap(), d("125"));
    }

    #[test]
    fn test_fifo_sell_across_lots() {
        let mut ledger = fifo_ledger();
        ledger.apply_trade(Side::Buy, d("1"), d("100")).unwrap();
        ledger.apply_trade(Side::Buy, d("1"), d("200")).unwrap();

        // First lot fully, half of the second.
        let trade = ledger.apply_trade(Side::Sell, d("1.5"), d("180")).unwrap();
        assert_eq!(trade.realized_pnl, d("80") + d("-10"));
        assert_eq!(ledger.quantity(), d("0.5"));
        assert_eq!(ledger.avg_entry(), d("200"));

        ledger.apply_trade(Side::Sell, d("0.5"), d("220")).unwrap();
        assert!(ledger.state().is_flat());
        assert_eq!(ledger.realized_pnl(), d("80"));
    }

    #[test]
    fn test_fifo_and_average_agree_on_single_lot() {
        let mut avg = ledger();
        let mut fifo = fifo_ledger();
        for l in [&mut avg, &mut fifo] {
            l.apply_trade(Side::Buy, d("3"), d("50")).unwrap();
            l.apply_trade(Side::Sell, d("1"), d("60")).unwrap();
        }
        assert_eq!(avg.snapshot().realized_pnl, fifo.snapshot().realized_pnl);
        assert_eq!(avg.avg_entry(), fifo.avg_entry());
    }

    #[test]
    fn test_unrealized_pnl_rejects_non_positive_mark() {
        let ledger = ledger();
        assert_eq!(
            ledger.unrealized_pnl(Decimal::zero()),
            Err(LedgerError::InvalidPrice(Decimal::zero()))
        );
        assert!(ledger.unrealized_pnl(d("-1")).is_err());
    }

    #[test]
    fn test_reset_realized_pnl_keeps_position() {
        let mut ledger = ledger();
        ledger.apply_trade(Side::Buy, d("2"), d("100")).unwrap();
        ledger.apply_trade(Side::Sell, d("1"), d("150")).unwrap();
        assert_eq!(ledger.realized_pnl(), d("50"));

        ledger.reset_realized_pnl();
        assert_eq!(ledger.realized_pnl(), Decimal::zero());
        assert_eq!(ledger.quantity(), d("1"));
        assert_eq!(ledger.trades().len(), 2);
    }

    #[test]
    fn test_restore_replays_with_original_stamps() {
        let mut original = ledger();
        original.apply_trade(Side::Buy, d("1"), d("100")).unwrap();
        original.apply_trade(Side::Buy, d("1"), d("200")).unwrap();
        original.apply_trade(Side::Sell, d("1"), d("180")).unwrap();

        let mut restored = ledger();
        let count = restored.restore(original.trades().all()).unwrap();

        assert_eq!(count, 3);
        assert_eq!(restored.snapshot(), original.snapshot());
        assert_eq!(restored.trades().all(), original.trades().all());
    }

    #[test]
    fn test_restore_rejects_foreign_symbol() {
        let mut eth = PositionLedger::new(Symbol::new("ETH-USD".to_string()));
        eth.apply_trade(Side::Buy, d("1"), d("3000")).unwrap();

        let mut btc = ledger();
        assert!(matches!(
            btc.restore(eth.trades().all()),
            Err(LedgerError::InvalidTrade(_))
        ));
        assert!(btc.trades().is_empty());
    }

    #[test]
    fn test_restore_is_all_or_nothing() {
        let mut source = ledger();
        source.apply_trade(Side::Buy, d("1"), d("100")).unwrap();
        source.apply_trade(Side::Sell, d("1"), d("110")).unwrap();
        let sell = source.trades().all()[1].clone();
        let mut second_sell = sell.clone();
        second_sell.id = Uuid::new_v4();

        let mut restored = ledger();
        restored.apply_trade(Side::Buy, d("1"), d("50")).unwrap();
        let before = restored.snapshot();

        // The first sell closes the position; the second has nothing to close.
        assert!(matches!(
            restored.restore(&[sell, second_sell]),
            Err(LedgerError::Position { .. })
        ));
        assert_eq!(restored.snapshot(), before);
        assert_eq!(restored.trades().len(), 1);
    }

    #[test]
    fn test_restore_with_resets_replays_reset_points() {
        let mut original = ledger();
        original.apply_trade(Side::Buy, d("2"), d("100")).unwrap();
        original.apply_trade(Side::Sell, d("1"), d("150")).unwrap();
        original.reset_realized_pnl();
        original.apply_trade(Side::Sell, d("1"), d("110")).unwrap();
        assert_eq!(original.realized_pnl(), d("10"));

        let mut restored = ledger();
        restored
            .restore_with_resets(original.trades().all(), &[2])
            .unwrap();
        assert_eq!(restored.snapshot(), original.snapshot());

        // A reset recorded after the last trade still applies.
        let mut trailing = ledger();
        trailing
            .restore_with_resets(&original.trades().all()[..2], &[2])
            .unwrap();
        assert_eq!(trailing.realized_pnl(), Decimal::zero());
        assert_eq!(trailing.quantity(), d("1"));
    }

    #[test]
    fn test_overflowing_buy_is_rejected_without_change() {
        let mut ledger = ledger();
        ledger.apply_trade(Side::Buy, d("1"), d("100")).unwrap();
        let before = ledger.snapshot();

        let err = ledger
            .apply_trade(Side::Buy, d("100000000000000000000"), d("1000000000"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTrade(msg) if msg.contains("overflows")));
        assert_eq!(ledger.snapshot(), before);
        assert_eq!(ledger.trades().len(), 1);
    }

    #[test]
    fn test_overflowing_fifo_buy_and_mark_are_errors() {
        let mut fifo = fifo_ledger();
        assert!(matches!(
            fifo.apply_trade(Side::Buy, d("100000000000000000000"), d("1000000000")),
            Err(LedgerError::InvalidTrade(_))
        ));
        assert!(fifo.trades().is_empty());

        let mut avg = ledger();
        avg.apply_trade(Side::Buy, d("100000000000000000000"), d("1"))
            .unwrap();
        assert!(matches!(
            avg.unrealized_pnl(d("1000000000")),
            Err(LedgerError::InvalidTrade(_))
        ));
    }

    #[test]
    fn test_partial_sell_relieves_cost_at_average() {
        let mut ledger = ledger();
        ledger.apply_trade(Side::Buy, d("1"), d("1")).unwrap();
        ledger.apply_trade(Side::Buy, d("2"), d("2")).unwrap();
        let avg = ledger.avg_entry();

        ledger.apply_trade(Side::Sell, d("1"), d("2")).unwrap();
        assert_eq!(ledger.avg_entry(), avg);
        // Remaining cost plus the relieved unit is exactly the original spend.
        assert_eq!(ledger.state().cost + avg, d("5"));

        ledger.apply_trade(Side::Buy, d("1"), d("3")).unwrap();
        assert_eq!(ledger.state().cost, d("8") - avg);
    }
}
