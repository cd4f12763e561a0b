//! Price producer and consumer tasks.
//!
//! The producer polls a [`PriceFeed`] and sends events over a bounded channel;
//! the consumer writes them into the session's price buffers. The producer
//! never touches a ledger.

use crate::domain::{PriceTick, Symbol};
use crate::feed::PriceFeed;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::TradingSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Tick(PriceTick),
    /// No fresh price this cycle because the fetch failed or timed out.
    Stale { symbol: Symbol, reason: String },
}

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Fetch one price, bounded by `timeout`. `None` means the feed had nothing new.
pub async fn poll_once(feed: &dyn PriceFeed, symbol: &Symbol, timeout: Duration) -> Option<FeedEvent> {
    match tokio::time::timeout(timeout, feed.fetch_price(symbol)).await {
        Ok(Ok(Some(tick))) => Some(FeedEvent::Tick(tick)),
        Ok(Ok(None)) => None,
        Ok(Err(e)) => Some(FeedEvent::Stale {
            symbol: symbol.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Some(FeedEvent::Stale {
            symbol: symbol.clone(),
            reason: format!("Timed out after {}ms", timeout.as_millis()),
        }),
    }
}

/// Poll every symbol once per interval until the receiver is dropped.
pub async fn run_price_producer(
    feed: Arc<dyn PriceFeed>,
    symbols: Vec<Symbol>,
    settings: PollSettings,
    tx: mpsc::Sender<FeedEvent>,
) {
    let mut timer = tokio::time::interval(settings.interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        timer.tick().await;

        for symbol in &symbols {
            let Some(event) = poll_once(feed.as_ref(), symbol, settings.timeout).await else {
                debug!("No price update for {}", symbol);
                continue;
            };
            if let FeedEvent::Stale { symbol, reason } = &event {
                warn!("Stale price data for {}: {}", symbol, reason);
            }
            if tx.send(event).await.is_err() {
                info!("Price consumer gone; stopping producer");
                return;
            }
        }
    }
}

pub fn spawn_price_producer(
    feed: Arc<dyn PriceFeed>,
    symbols: Vec<Symbol>,
    settings: PollSettings,
    tx: mpsc::Sender<FeedEvent>,
) -> JoinHandle<()> {
    tokio::spawn(run_price_producer(feed, symbols, settings, tx))
}

/// Drain feed events into `session` until every sender is dropped.
pub async fn run_price_consumer(mut rx: mpsc::Receiver<FeedEvent>, session: Arc<TradingSession>) {
    while let Some(event) = rx.recv().await {
        match event {
            FeedEvent::Tick(tick) => {
                session.record_tick(tick).await;
            }
            FeedEvent::Stale { symbol, reason } => {
                session.mark_stale(&symbol, &reason).await;
            }
        }
    }
    debug!("Feed channel closed");
}

pub fn spawn_price_consumer(
    rx: mpsc::Receiver<FeedEvent>,
    session: Arc<TradingSession>,
) -> JoinHandle<()> {
    tokio::spawn(run_price_consumer(rx, session))
}
