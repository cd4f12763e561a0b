pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;
pub mod intake;
pub mod orchestration;

pub use config::{Config, FeedMode};
pub use db::{init_db, TradeRepository};
pub use domain::{Decimal, OrderType, PriceTick, Side, Symbol, TimeMs, Trade};
pub use engine::{PositionLedger, SignalHeuristic};
pub use error::AppError;
pub use feed::{FeedError, PriceFeed};
pub use intake::{OrderIntake, OrderRequest, TradingMode};
pub use orchestration::TradingSession;
