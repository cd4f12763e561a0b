//! Session ownership and the background price pipeline.

pub mod pump;
pub mod session;

pub use pump::{
    poll_once, run_price_consumer, run_price_producer, spawn_price_consumer,
    spawn_price_producer, FeedEvent, PollSettings,
};
pub use session::{Instrument, PositionReport, PriceStatus, SessionError, TradingSession};
