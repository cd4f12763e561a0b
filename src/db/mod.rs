//! SQLite trade journal.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - `TradeRepository` for appending and replaying trades

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::TradeRepository;
