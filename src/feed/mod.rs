//! Price feed abstraction and the bounded price history it fills.

use crate::domain::{PriceTick, Symbol};
use async_trait::async_trait;
use std::fmt;

pub mod buffer;
pub mod coinbase;
pub mod mock;
pub mod random_walk;

pub use buffer::PriceBuffer;
pub use coinbase::CoinbaseFeed;
pub use mock::MockFeed;
pub use random_walk::RandomWalkFeed;

/// A source of the latest trade price for an instrument.
///
/// Implementations are polled by the price producer; they must not block
/// indefinitely and never see the ledger.
#[async_trait]
pub trait PriceFeed: Send + Sync + fmt::Debug {
    /// Fetch the most recent price for `symbol`.
    ///
    /// # Returns
    /// `None` when the source has nothing new this cycle.
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Option<PriceTick>, FeedError>;
}

/// Error type for feed operations. These never reach the ledger; the
/// producer reports them as stale data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Network error (e.g., connection refused, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 404 unknown product, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed price)
    ParseError(String),
    RateLimited,
    /// The fetch did not complete within the poll timeout
    Timeout,
    Other(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            FeedError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            FeedError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            FeedError::RateLimited => write!(f, "Rate limited"),
            FeedError::Timeout => write!(f, "Timed out"),
            FeedError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_display() {
        let err = FeedError::NetworkError("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");

        let err = FeedError::HttpError {
            status: 503,
            message: "Server error".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: Server error");

        assert_eq!(FeedError::RateLimited.to_string(), "Rate limited");
        assert_eq!(FeedError::Timeout.to_string(), "Timed out");
    }
}
