//! Scripted feed for tests without network calls.

use super::{FeedError, PriceFeed};
use crate::domain::{Decimal, PriceTick, Symbol, TimeMs};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockStep {
    Price(Decimal),
    Fail(FeedError),
}

/// Replays a fixed script of prices and failures, then reports no update.
/// The script is shared across symbols.
#[derive(Debug, Default)]
pub struct MockFeed {
    script: Mutex<VecDeque<MockStep>>,
    delay: Option<Duration>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, price: Decimal) -> Self {
        self.push(MockStep::Price(price))
    }

    pub fn with_prices(self, prices: impl IntoIterator<Item = Decimal>) -> Self {
        prices.into_iter().fold(self, |feed, p| feed.with_price(p))
    }

    pub fn with_error(self, err: FeedError) -> Self {
        self.push(MockStep::Fail(err))
    }

    /// Sleep this long before every answer, to exercise poll timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, step: MockStep) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
        self
    }

    fn next_step(&self) -> Result<Option<MockStep>, FeedError> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| FeedError::Other("mock script poisoned".to_string()))?;
        Ok(script.pop_front())
    }
}

#[async_trait]
impl PriceFeed for MockFeed {
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Option<PriceTick>, FeedError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_step()? {
            Some(MockStep::Price(price)) => {
                Ok(Some(PriceTick::new(symbol.clone(), TimeMs::now(), price)))
            }
            Some(MockStep::Fail(err)) => Err(err),
            None => Ok(None),
        }
    }
}
