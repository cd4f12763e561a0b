use crate::config::Config;
use crate::db::TradeRepository;
use crate::domain::{Decimal, PriceTick, Symbol, TimeMs, Trade};
use crate::engine::{LedgerError, LedgerSnapshot, PositionLedger, Signal, SignalHeuristic};
use crate::feed::PriceBuffer;
use crate::intake::{IntakeError, OrderIntake, OrderRequest};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Ledger and price history for one instrument. Each is locked independently.
#[derive(Debug)]
pub struct Instrument {
    ledger: Mutex<PositionLedger>,
    prices: RwLock<PriceBuffer>,
}

/// Latest price and feed health for one instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceStatus {
    pub latest: Option<PriceTick>,
    pub stale: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionReport {
    pub snapshot: LedgerSnapshot,
    pub mark_price: Option<Decimal>,
    /// None until the feed has produced a mark price.
    pub unrealized_pnl: Option<Decimal>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown symbol {0}")]
    UnknownSymbol(Symbol),
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error("journal error: {0}")]
    Journal(#[from] sqlx::Error),
    #[error("journal replay for {symbol} failed: {source}")]
    Replay {
        symbol: Symbol,
        source: LedgerError,
    },
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

/// One trading session: every instrument's ledger, its price history, and
/// the order intake in front of them.
pub struct TradingSession {
    symbols: Vec<Symbol>,
    instruments: HashMap<Symbol, Instrument>,
    intake: OrderIntake,
    heuristic: SignalHeuristic,
    journal: Option<Arc<TradeRepository>>,
}

impl TradingSession {
    pub fn new(config: &Config) -> Self {
        let settings = config.ledger_settings();
        let instruments = config
            .symbols
            .iter()
            .map(|symbol| {
                let instrument = Instrument {
                    ledger: Mutex::new(PositionLedger::with_settings(symbol.clone(), settings)),
                    prices: RwLock::new(PriceBuffer::new(config.price_history_capacity)),
                };
                (symbol.clone(), instrument)
            })
            .collect();

        Self {
            symbols: config.symbols.clone(),
            instruments,
            intake: OrderIntake::new(config.trading_mode),
            heuristic: SignalHeuristic::new(config.signal_window, config.signal_method),
            journal: None,
        }
    }

    /// Journal every fill to `repo` from now on.
    pub fn with_journal(mut self, repo: Arc<TradeRepository>) -> Self {
        self.journal = Some(repo);
        self
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn intake(&self) -> &OrderIntake {
        &self.intake
    }

    fn instrument(&self, symbol: &Symbol) -> Result<&Instrument, SessionError> {
        self.instruments
            .get(symbol)
            .ok_or_else(|| SessionError::UnknownSymbol(symbol.clone()))
    }

    /// Rebuild every ledger from the journal, including realized P&L resets.
    /// Returns the number of trades replayed.
    pub async fn restore_from_journal(&self) -> Result<usize, SessionError> {
        let Some(journal) = &self.journal else {
            return Ok(0);
        };

        let mut total = 0;
        for symbol in &self.symbols {
            let trades = journal.query_trades(Some(symbol)).await?;
            let resets = journal.query_pnl_resets(symbol).await?;
            if trades.is_empty() {
                continue;
            }
            let instrument = self.instrument(symbol)?;
            let mut ledger = instrument.ledger.lock().await;
            let replayed = ledger
                .restore_with_resets(&trades, &resets)
                .map_err(|source| SessionError::Replay {
                    symbol: symbol.clone(),
                    source,
                })?;
            info!(
                "Restored {} trades and {} P&L resets for {}",
                replayed,
                resets.len(),
                symbol
            );
            total += replayed;
        }
        Ok(total)
    }

    /// Store a feed tick. Ticks for unconfigured symbols or with non-positive
    /// prices are dropped.
    pub async fn record_tick(&self, tick: PriceTick) -> bool {
        let Some(instrument) = self.instruments.get(&tick.symbol) else {
            warn!("Dropping tick for unconfigured symbol {}", tick.symbol);
            return false;
        };
        instrument.prices.write().await.push(tick)
    }

    pub async fn mark_stale(&self, symbol: &Symbol, reason: &str) {
        if let Some(instrument) = self.instruments.get(symbol) {
            instrument.prices.write().await.mark_stale(reason);
        }
    }

    pub async fn price_status(&self, symbol: &Symbol) -> Result<PriceStatus, SessionError> {
        let prices = self.instrument(symbol)?.prices.read().await;
        Ok(PriceStatus {
            latest: prices.latest().cloned(),
            stale: prices.is_stale(),
            last_error: prices.last_error().map(str::to_string),
        })
    }

    pub async fn recent_prices(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<PriceTick>, SessionError> {
        Ok(self.instrument(symbol)?.prices.read().await.last_n(limit))
    }

    /// Fill an order against its instrument's ledger.
    ///
    /// The ledger lock is held until the fill is journaled, so journal order
    /// matches ledger order. A failed journal write is logged; the fill stands.
    pub async fn submit_order(&self, request: &OrderRequest) -> Result<Trade, SessionError> {
        let instrument = self.instrument(&request.symbol)?;
        let mark = instrument.prices.read().await.latest_price();

        let mut ledger = instrument.ledger.lock().await;
        let trade = self.intake.submit(&mut ledger, request, mark)?;

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.insert_trade(&trade).await {
                warn!("Failed to journal trade {}: {}", trade.id, e);
            }
        }
        Ok(trade)
    }

    pub async fn position(&self, symbol: &Symbol) -> Result<PositionReport, SessionError> {
        let instrument = self.instrument(symbol)?;
        let mark_price = instrument.prices.read().await.latest_price();

        let ledger = instrument.ledger.lock().await;
        let unrealized_pnl = mark_price.and_then(|mark| ledger.unrealized_pnl(mark).ok());
        Ok(PositionReport {
            snapshot: ledger.snapshot(),
            mark_price,
            unrealized_pnl,
        })
    }

    /// Trades for `symbol`, oldest first; the last `limit` when given.
    pub async fn trades(
        &self,
        symbol: &Symbol,
        limit: Option<usize>,
    ) -> Result<Vec<Trade>, SessionError> {
        let ledger = self.instrument(symbol)?.ledger.lock().await;
        let log = ledger.trades();
        let trades = match limit {
            Some(n) => log.recent(n),
            None => log.all(),
        };
        Ok(trades.to_vec())
    }

    pub async fn trades_csv(&self, symbol: &Symbol) -> Result<Vec<u8>, SessionError> {
        let ledger = self.instrument(symbol)?.ledger.lock().await;
        let mut out = Vec::new();
        ledger.trades().write_csv(&mut out)?;
        Ok(out)
    }

    pub fn signal_window(&self) -> usize {
        self.heuristic.window()
    }

    pub async fn signal(&self, symbol: &Symbol) -> Result<Signal, SessionError> {
        let prices = self
            .instrument(symbol)?
            .prices
            .read()
            .await
            .last_n_prices(self.heuristic.window());
        Ok(self.heuristic.evaluate(&prices))
    }

    /// Zero realized P&L. Journaled like a fill: a failed write is logged and
    /// the reset stands.
    pub async fn reset_realized_pnl(&self, symbol: &Symbol) -> Result<LedgerSnapshot, SessionError> {
        let mut ledger = self.instrument(symbol)?.ledger.lock().await;
        ledger.reset_realized_pnl();

        let snapshot = ledger.snapshot();
        if let Some(journal) = &self.journal {
            if let Err(e) = journal
                .insert_pnl_reset(symbol, snapshot.trade_count, TimeMs::now())
                .await
            {
                warn!("Failed to journal P&L reset for {}: {}", symbol, e);
            }
        }
        info!("Realized P&L reset for {}", symbol);
        Ok(snapshot)
    }
}
